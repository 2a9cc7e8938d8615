//! Lathe recipe processing.
//!
//! Three sources combine here: recipe categories, the lathe machine
//! entities (which recipes each lathe offers and with which cost and
//! time modifiers), and the recipes themselves. Recipes resolve their
//! inheritance, lose abstract bases and the consumed parent link, have
//! their material costs scaled back from the upstream's hundredths, and
//! fan out into the four derived tables: recipes by lathe, recipes by
//! recipe id, recipe ids by product id, and recipe ids by method and
//! availability.

use super::{has_parent_link, is_abstract};
use crate::error::PipelineError;
use crate::stage;
use crate::workspace::Workspace;
use protosync_core::{Pool, ResolveOptions, resolve};
use protosync_data::schema::{
    Availability, EmagLatheComponent, LatheCategory, LatheComponent, LatheRecipe, MachineEntity,
    prototype_type,
};
use rayon::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// A lathe machine's recipe lists and production modifiers.
#[derive(Debug)]
struct Lathe {
    id: String,
    static_recipes: Vec<String>,
    dynamic_recipes: Vec<String>,
    emag_static_recipes: Vec<String>,
    emag_dynamic_recipes: Vec<String>,
    material_use_multiplier: f64,
    time_multiplier: f64,
}

impl Lathe {
    fn availability_of(&self, recipe_id: &str) -> Option<Availability> {
        let id = recipe_id.to_string();
        if self.static_recipes.contains(&id) {
            Some(Availability::Static)
        } else if self.dynamic_recipes.contains(&id) {
            Some(Availability::Dynamic)
        } else if self.emag_static_recipes.contains(&id) {
            Some(Availability::EmagStatic)
        } else if self.emag_dynamic_recipes.contains(&id) {
            Some(Availability::EmagDynamic)
        } else {
            None
        }
    }

    fn has_recipe(&self, recipe_id: &str) -> bool {
        self.availability_of(recipe_id).is_some()
    }
}

pub fn process(ws: &Workspace) -> Result<(), PipelineError> {
    // Categories: parsed and republished as-is.
    let data_path = stage::data_path("recipes.lathes.categories")?;
    let files = stage::converted_files(ws, data_path)?;
    let categories: Vec<LatheCategory> = stage::parse_records(&files, "latheCategory")?;
    stage::write_output(ws, data_path, &categories)?;

    let lathes = load_lathes(ws)?;
    let concrete = load_recipes(ws)?;

    // Fan recipes out to the lathes that offer them, applying each
    // lathe's modifiers to its own copy.
    let mut by_lathe: BTreeMap<String, Vec<LatheRecipe>> = BTreeMap::new();
    for recipe in &concrete {
        if recipe.result.is_none() && recipe.result_reagents.is_none() {
            warn!(id = %recipe.id, "skipping recipe without a product");
            continue;
        }

        let holders: Vec<&Lathe> = lathes
            .iter()
            .filter(|lathe| lathe.has_recipe(&recipe.id))
            .collect();
        if holders.is_empty() {
            debug!(id = %recipe.id, "recipe belongs to no lathe");
            continue;
        }

        for lathe in holders {
            let mut assigned = recipe.clone();
            assigned.availability = Some(lathe.availability_of(&recipe.id).ok_or_else(|| {
                PipelineError::UnknownAvailability {
                    recipe: recipe.id.clone(),
                    lathe: lathe.id.clone(),
                }
            })?);

            if lathe.material_use_multiplier != 1.0 {
                if let Some(materials) = assigned.materials.as_mut() {
                    for (material, amount) in materials.iter_mut() {
                        let value =
                            amount
                                .as_f64()
                                .ok_or_else(|| PipelineError::NonNumericMaterial {
                                    recipe: recipe.id.clone(),
                                    material: material.clone(),
                                })?;
                        // Material costs round to 2 digits in-game.
                        *amount = json_number(round_to_digit(
                            value * lathe.material_use_multiplier,
                            2,
                        ))
                        .ok_or_else(|| PipelineError::NonNumericMaterial {
                            recipe: recipe.id.clone(),
                            material: material.clone(),
                        })?;
                    }
                }
            }

            if lathe.time_multiplier != 1.0 {
                if let Some(completetime) = assigned.completetime {
                    assigned.completetime = Some(completetime * lathe.time_multiplier);
                }
            }

            by_lathe.entry(lathe.id.clone()).or_default().push(assigned);
        }
    }

    info!(
        lathes = by_lathe.len(),
        recipes = concrete.len(),
        "grouped recipes by lathe"
    );
    stage::write_output(ws, stage::data_path("recipes.lathes")?, &by_lathe)?;

    write_recipes_by_id(ws, &by_lathe)?;
    write_recipe_ids_by_product(ws, &by_lathe)?;
    write_recipe_ids_by_method(ws, &by_lathe)?;

    Ok(())
}

/// Read the lathe machine entities and their recipe components.
fn load_lathes(ws: &Workspace) -> Result<Vec<Lathe>, PipelineError> {
    let data_path = stage::data_path("recipes.lathes.machines")?;
    let files = stage::converted_files(ws, data_path)?;

    let machine_records = stage::filter_prototypes(&files, prototype_type::ENTITY);
    stage::write_output(ws, data_path, &machine_records)?;

    let mut lathes = Vec::new();
    for file in &files {
        for record in &file.records {
            if !protosync_data::schema::is_prototype_of(record, prototype_type::ENTITY) {
                continue;
            }

            let machine: MachineEntity =
                serde_json::from_value(record.clone()).map_err(|e| PipelineError::Schema {
                    file: file.path.clone(),
                    kind: "entity",
                    detail: e.to_string(),
                })?;
            let Some(id) = machine.id.clone() else {
                return Err(PipelineError::LatheWithoutId {
                    file: file.path.clone(),
                });
            };

            let lathe_component: LatheComponent = match machine.component("Lathe") {
                Some(component) => {
                    serde_json::from_value(component.clone()).map_err(|e| {
                        PipelineError::Schema {
                            file: file.path.clone(),
                            kind: "Lathe component",
                            detail: e.to_string(),
                        }
                    })?
                }
                None => LatheComponent::default(),
            };
            let emag_component: EmagLatheComponent = match machine.component("EmagLatheRecipes") {
                Some(component) => {
                    serde_json::from_value(component.clone()).map_err(|e| {
                        PipelineError::Schema {
                            file: file.path.clone(),
                            kind: "EmagLatheRecipes component",
                            detail: e.to_string(),
                        }
                    })?
                }
                None => EmagLatheComponent::default(),
            };

            lathes.push(Lathe {
                id,
                static_recipes: lathe_component.static_recipes.unwrap_or_default(),
                dynamic_recipes: lathe_component.dynamic_recipes.unwrap_or_default(),
                emag_static_recipes: emag_component.emag_static_recipes.unwrap_or_default(),
                emag_dynamic_recipes: emag_component.emag_dynamic_recipes.unwrap_or_default(),
                material_use_multiplier: lathe_component.material_use_multiplier.unwrap_or(1.0),
                time_multiplier: lathe_component.time_multiplier.unwrap_or(1.0),
            });
        }
    }

    info!(lathes = lathes.len(), "loaded lathe machines");
    Ok(lathes)
}

/// Read the recipes, resolve their inheritance, drop abstract bases,
/// strip the consumed parent link, and scale material costs down from
/// the upstream's hundredths.
fn load_recipes(ws: &Workspace) -> Result<Vec<LatheRecipe>, PipelineError> {
    let data_path = stage::data_path("recipes.lathes")?;
    let files = stage::converted_files(ws, data_path)?;

    // Shape check with file context before the records go raw into the
    // resolver.
    let _: Vec<LatheRecipe> = stage::parse_records(&files, "latheRecipe")?;

    let raw: Vec<Value> = files
        .iter()
        .flat_map(|file| file.records.iter().cloned())
        .collect();

    let pool = Pool::new(raw.clone(), "id")?;
    let opts = ResolveOptions::new(&["abstract"], &[]);

    let resolved = raw
        .par_iter()
        .map(|record| -> Result<LatheRecipe, PipelineError> {
            let value = if has_parent_link(record) {
                resolve(record, &pool, "parent", &opts)?
            } else {
                record.clone()
            };
            let id = value
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            serde_json::from_value(value).map_err(|e| PipelineError::ResolvedSchema {
                kind: "latheRecipe",
                id,
                detail: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut concrete: Vec<LatheRecipe> = resolved
        .into_iter()
        .filter(|recipe| !recipe.is_abstract())
        .collect();

    for recipe in &mut concrete {
        let recipe_id = recipe.id.clone();

        // The parent link is spent once resolution is done.
        recipe.parent = None;

        let materials = recipe
            .materials
            .as_mut()
            .ok_or(PipelineError::RecipeWithoutMaterials { id: recipe_id.clone() })?;
        for (material, amount) in materials.iter_mut() {
            let value = amount
                .as_f64()
                .ok_or_else(|| PipelineError::NonNumericMaterial {
                    recipe: recipe_id.clone(),
                    material: material.clone(),
                })?;
            // Upstream stores cost * 100.
            *amount =
                json_number(value / 100.0).ok_or_else(|| PipelineError::NonNumericMaterial {
                    recipe: recipe_id.clone(),
                    material: material.clone(),
                })?;
        }
    }

    Ok(concrete)
}

fn write_recipes_by_id(
    ws: &Workspace,
    by_lathe: &BTreeMap<String, Vec<LatheRecipe>>,
) -> Result<(), PipelineError> {
    let mut by_id: BTreeMap<String, LatheRecipe> = BTreeMap::new();
    for recipes in by_lathe.values() {
        for recipe in recipes {
            let mut entry = recipe.clone();
            // Availability is per-lathe; it has no meaning here.
            entry.availability = None;
            by_id.insert(entry.id.clone(), entry);
        }
    }
    stage::write_output(ws, stage::data_path("recipes.by-recipe-ids")?, &by_id)?;
    Ok(())
}

fn write_recipe_ids_by_product(
    ws: &Workspace,
    by_lathe: &BTreeMap<String, Vec<LatheRecipe>>,
) -> Result<(), PipelineError> {
    let mut by_product: BTreeMap<String, Value> = BTreeMap::new();

    for recipes in by_lathe.values() {
        for recipe in recipes {
            if recipe.prototype_type != prototype_type::LATHE_RECIPE {
                return Err(PipelineError::UnknownRecipeType {
                    found: recipe.prototype_type.clone(),
                });
            }

            if let Some(result) = &recipe.result {
                add_recipe_for_product(&mut by_product, result, &recipe.id);
            }
            if let Some(reagents) = &recipe.result_reagents {
                for reagent_id in reagents.keys() {
                    add_recipe_for_product(&mut by_product, reagent_id, &recipe.id);
                }
            }
        }
    }

    stage::write_output(
        ws,
        stage::data_path("recipes.recipe-ids-by-product-ids")?,
        &by_product,
    )?;
    Ok(())
}

/// A product maps to one recipe id as a plain string; a second distinct
/// recipe turns the value into an array. Duplicates are never added.
fn add_recipe_for_product(by_product: &mut BTreeMap<String, Value>, product: &str, recipe: &str) {
    match by_product.get_mut(product) {
        None => {
            by_product.insert(product.to_string(), Value::String(recipe.to_string()));
        }
        Some(Value::String(existing)) => {
            if existing != recipe {
                let first = existing.clone();
                by_product.insert(
                    product.to_string(),
                    Value::Array(vec![Value::String(first), Value::String(recipe.to_string())]),
                );
            }
        }
        Some(Value::Array(existing)) => {
            if !existing.iter().any(|id| id.as_str() == Some(recipe)) {
                existing.push(Value::String(recipe.to_string()));
            }
        }
        Some(_) => {}
    }
}

fn write_recipe_ids_by_method(
    ws: &Workspace,
    by_lathe: &BTreeMap<String, Vec<LatheRecipe>>,
) -> Result<(), PipelineError> {
    let mut by_method: BTreeMap<String, BTreeMap<&'static str, Vec<String>>> = BTreeMap::new();

    for (lathe_id, recipes) in by_lathe {
        for recipe in recipes {
            let availability =
                recipe
                    .availability
                    .ok_or_else(|| PipelineError::UnknownAvailability {
                        recipe: recipe.id.clone(),
                        lathe: lathe_id.clone(),
                    })?;
            by_method
                .entry(lathe_id.clone())
                .or_default()
                .entry(availability.as_str())
                .or_default()
                .push(recipe.id.clone());
        }
    }

    stage::write_output(
        ws,
        stage::data_path("recipes.recipe-ids-by-method-and-availability")?,
        &by_method,
    )?;
    Ok(())
}

fn round_to_digit(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Represent a finite float as a JSON number, as an integer when whole.
fn json_number(value: f64) -> Option<Value> {
    if value.fract() == 0.0 && value.abs() < 9e15 {
        Some(Value::Number((value as i64).into()))
    } else {
        serde_json::Number::from_f64(value).map(Value::Number)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lathe(id: &str) -> Lathe {
        Lathe {
            id: id.to_string(),
            static_recipes: vec!["Crowbar".to_string()],
            dynamic_recipes: vec!["Flash".to_string()],
            emag_static_recipes: vec!["Shiv".to_string()],
            emag_dynamic_recipes: vec![],
            material_use_multiplier: 1.0,
            time_multiplier: 1.0,
        }
    }

    // -----------------------------------------------------------------------
    // Availability assignment
    // -----------------------------------------------------------------------

    #[test]
    fn availability_follows_list_membership() {
        let lathe = lathe("Autolathe");
        assert_eq!(lathe.availability_of("Crowbar"), Some(Availability::Static));
        assert_eq!(lathe.availability_of("Flash"), Some(Availability::Dynamic));
        assert_eq!(lathe.availability_of("Shiv"), Some(Availability::EmagStatic));
        assert_eq!(lathe.availability_of("Unlisted"), None);
        assert!(lathe.has_recipe("Crowbar"));
        assert!(!lathe.has_recipe("Unlisted"));
    }

    // -----------------------------------------------------------------------
    // Rounding and number shaping
    // -----------------------------------------------------------------------

    #[test]
    fn round_to_two_digits() {
        assert_eq!(round_to_digit(1.2345, 2), 1.23);
        assert_eq!(round_to_digit(1.235, 2), 1.24);
        assert_eq!(round_to_digit(100.0, 2), 100.0);
    }

    #[test]
    fn whole_costs_serialize_as_integers() {
        assert_eq!(json_number(5.0).unwrap(), json!(5));
        assert_eq!(json_number(2.25).unwrap(), json!(2.25));
        assert!(json_number(f64::NAN).is_none());
    }

    // -----------------------------------------------------------------------
    // Product index shape
    // -----------------------------------------------------------------------

    #[test]
    fn product_index_scales_from_string_to_array() {
        let mut by_product = BTreeMap::new();

        add_recipe_for_product(&mut by_product, "Steel", "RecipeA");
        assert_eq!(by_product["Steel"], json!("RecipeA"));

        // Same recipe again: no change.
        add_recipe_for_product(&mut by_product, "Steel", "RecipeA");
        assert_eq!(by_product["Steel"], json!("RecipeA"));

        add_recipe_for_product(&mut by_product, "Steel", "RecipeB");
        assert_eq!(by_product["Steel"], json!(["RecipeA", "RecipeB"]));

        add_recipe_for_product(&mut by_product, "Steel", "RecipeC");
        assert_eq!(by_product["Steel"], json!(["RecipeA", "RecipeB", "RecipeC"]));

        // Duplicate into an existing array: no change.
        add_recipe_for_product(&mut by_product, "Steel", "RecipeB");
        assert_eq!(by_product["Steel"], json!(["RecipeA", "RecipeB", "RecipeC"]));
    }
}
