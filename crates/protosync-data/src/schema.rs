//! Serde views of the prototype kinds the process stage reshapes.
//!
//! Inheritance resolution itself runs over raw JSON records (prototypes
//! are open-ended and every field must survive the merge); these structs
//! come into play around it. Strict kinds (`deny_unknown_fields`) reject
//! fields the upstream schema does not define, open kinds carry unknown
//! fields along through a flattened map, and plain kinds silently drop
//! them -- matching how the upstream validators treat each prototype.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The `type` field values of the prototype kinds this pipeline handles.
pub mod prototype_type {
    pub const ENTITY: &str = "entity";
    pub const LATHE_RECIPE: &str = "latheRecipe";
    pub const LATHE_CATEGORY: &str = "latheCategory";
    pub const REAGENT: &str = "reagent";
    pub const TECHNOLOGY: &str = "technology";
    pub const TECH_DISCIPLINE: &str = "techDiscipline";
}

/// Whether a raw record's `type` field names the given prototype kind.
pub fn is_prototype_of(record: &Value, type_name: &str) -> bool {
    record.get("type").and_then(Value::as_str) == Some(type_name)
}

/// A parent reference: one id, or an ordered list of ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParentRef {
    One(String),
    Many(Vec<String>),
}

// ===========================================================================
// Lathe recipes
// ===========================================================================

/// On what condition a recipe is available at a lathe. Assigned during
/// processing, never present in source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    #[serde(rename = "static")]
    Static,
    #[serde(rename = "dynamic")]
    Dynamic,
    #[serde(rename = "emag static")]
    EmagStatic,
    #[serde(rename = "emag dynamic")]
    EmagDynamic,
}

impl Availability {
    /// The wire name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Availability::Static => "static",
            Availability::Dynamic => "dynamic",
            Availability::EmagStatic => "emag static",
            Availability::EmagDynamic => "emag dynamic",
        }
    }
}

/// A lathe recipe prototype. Strict: unknown fields are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatheRecipe {
    #[serde(rename = "type")]
    pub prototype_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,

    /// Whether this recipe exists only to be inherited from.
    #[serde(default, rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub is_abstract: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,

    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Resulting item id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// Resulting reagents: reagent id to produced amount.
    #[serde(
        default,
        rename = "resultReagents",
        skip_serializing_if = "Option::is_none"
    )]
    pub result_reagents: Option<serde_json::Map<String, Value>>,

    /// Production duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completetime: Option<f64>,

    #[serde(
        default,
        rename = "applyMaterialDiscount",
        skip_serializing_if = "Option::is_none"
    )]
    pub apply_material_discount: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<RecipeIcon>,

    /// Material id to required amount. Upstream stores amounts
    /// multiplied by 100; processing divides them back down.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materials: Option<serde_json::Map<String, Value>>,
}

impl LatheRecipe {
    pub fn is_abstract(&self) -> bool {
        self.is_abstract.unwrap_or(false)
    }
}

/// A recipe's icon sprite reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeIcon {
    pub sprite: String,
    pub state: String,
}

/// A lathe recipe category. Strict.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatheCategory {
    #[serde(rename = "type")]
    pub prototype_type: String,
    pub id: String,
    pub name: String,
}

// ===========================================================================
// Lathe machines
// ===========================================================================

/// Minimal view of a lathe machine entity: identity plus components.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineEntity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub components: Vec<Value>,
}

impl MachineEntity {
    /// Find a component by its `type` field.
    pub fn component(&self, type_name: &str) -> Option<&Value> {
        self.components
            .iter()
            .find(|component| component.get("type").and_then(Value::as_str) == Some(type_name))
    }
}

/// The `Lathe` component of a lathe machine entity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatheComponent {
    #[serde(default, rename = "staticRecipes")]
    pub static_recipes: Option<Vec<String>>,
    #[serde(default, rename = "dynamicRecipes")]
    pub dynamic_recipes: Option<Vec<String>>,
    #[serde(default, rename = "timeMultiplier")]
    pub time_multiplier: Option<f64>,
    #[serde(default, rename = "materialUseMultiplier")]
    pub material_use_multiplier: Option<f64>,
}

/// The `EmagLatheRecipes` component: recipes unlocked by emagging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmagLatheComponent {
    #[serde(default, rename = "emagStaticRecipes")]
    pub emag_static_recipes: Option<Vec<String>>,
    #[serde(default, rename = "emagDynamicRecipes")]
    pub emag_dynamic_recipes: Option<Vec<String>>,
}

// ===========================================================================
// Reagents
// ===========================================================================

/// A reagent prototype. Open-ended: unknown fields ride along in `extra`
/// and survive reserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reagent {
    #[serde(rename = "type")]
    pub prototype_type: String,

    pub id: String,

    /// Locale key before localization, display string after.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Locale key before localization, display string after.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    #[serde(
        default,
        rename = "physicalDesc",
        skip_serializing_if = "Option::is_none"
    )]
    pub physical_desc: Option<String>,

    #[serde(default, rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub is_abstract: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Reagent {
    pub fn is_abstract(&self) -> bool {
        self.is_abstract.unwrap_or(false)
    }
}

// ===========================================================================
// Research
// ===========================================================================

/// A technology prototype. Strict.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tech {
    #[serde(rename = "type")]
    pub prototype_type: String,

    pub id: String,

    /// Locale key before localization, display string after.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Value>,

    /// Discipline this tech belongs to.
    pub discipline: String,

    pub tier: u32,

    /// Cost in research points.
    pub cost: u32,

    /// Ids of recipes this research unlocks.
    #[serde(rename = "recipeUnlocks")]
    pub recipe_unlocks: Vec<String>,

    /// Ids of techs required before this one can be unlocked.
    #[serde(
        default,
        rename = "technologyPrerequisites",
        skip_serializing_if = "Option::is_none"
    )]
    pub technology_prerequisites: Option<Vec<String>>,
}

/// A research discipline prototype. Unknown fields are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discipline {
    #[serde(rename = "type")]
    pub prototype_type: String,

    pub id: String,

    /// Locale key before localization, display string after.
    pub name: String,

    /// Display color code.
    pub color: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Value>,

    /// Fraction of lower-tier research required per tier, keyed by tier
    /// number.
    #[serde(rename = "tierPrerequisites")]
    pub tier_prerequisites: BTreeMap<String, f64>,
}

// ===========================================================================
// Tests
// ===========================================================================
