//! The compiled-in data-path table.
//!
//! One entry per file or directory the pipeline moves through its
//! stages. Every path is relative: `upstream_path` to the upstream
//! checkout, `input_path`/`converted_path` to their stage trees, and
//! `output_file` to the output tree. Entries with only an `output_file`
//! are derived tables produced by the process stage; entries with a
//! `wiki_page` as well are picked up by the publish stage.

use protosync_data::TagPolicy;

/// Whether a data path refers to a single file or a directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPathKind {
    File,
    Dir,
}

/// One entry of the data-path table.
#[derive(Debug)]
pub struct DataPath {
    pub alias: &'static str,
    pub kind: DataPathKind,

    /// Location inside the upstream checkout; absent for derived-only
    /// outputs.
    pub upstream_path: Option<&'static str>,

    /// Glob patterns skipped when importing a directory. A pattern
    /// matching a directory component excludes the whole subtree.
    pub exclude: &'static [&'static str],

    /// Location inside the input tree.
    pub input_path: Option<&'static str>,

    /// Location inside the converted tree.
    pub converted_path: Option<&'static str>,

    /// How custom YAML tags are handled when converting this path.
    pub tag_policy: TagPolicy,

    /// The single JSON file a processing step writes for this path.
    pub output_file: Option<&'static str>,

    /// Wiki page title the output is published to.
    pub wiki_page: Option<&'static str>,
}

/// The full table. Order is meaningful only for humans reading logs.
pub const DATA_PATHS: &[DataPath] = &[
    // ================
    // locale

    DataPath {
        alias: "locale",
        kind: DataPathKind::Dir,
        upstream_path: Some("Resources/Locale"),
        exclude: &[],
        input_path: Some("Locale"),
        converted_path: None,
        tag_policy: TagPolicy::Reject,
        output_file: None,
        wiki_page: None,
    },
    // ================
    // lathe recipes

    DataPath {
        alias: "recipes.lathes",
        kind: DataPathKind::Dir,
        upstream_path: Some("Resources/Prototypes/Recipes/Lathes"),
        // recipe categories live in the same directory but are their
        // own data path
        exclude: &["categories.yml"],
        input_path: Some("Recipes/Lathes/recipes"),
        converted_path: Some("Recipes/Lathes/recipes"),
        tag_policy: TagPolicy::Reject,
        output_file: Some("Recipes/Lathes/lathes.json"),
        wiki_page: None,
    },
    DataPath {
        alias: "recipes.lathes.categories",
        kind: DataPathKind::File,
        upstream_path: Some("Resources/Prototypes/Recipes/Lathes/categories.yml"),
        exclude: &[],
        input_path: Some("Recipes/Lathes/categories.yml"),
        converted_path: Some("Recipes/Lathes/categories.json"),
        tag_policy: TagPolicy::Reject,
        output_file: Some("Recipes/Lathes/categories.json"),
        wiki_page: None,
    },
    // lathe machine entities: which recipes each lathe offers, by
    // default, when researched, and when emagged
    DataPath {
        alias: "recipes.lathes.machines",
        kind: DataPathKind::File,
        upstream_path: Some("Resources/Prototypes/Entities/Structures/Machines/lathe.yml"),
        exclude: &[],
        input_path: Some("Recipes/Lathes/machines.yml"),
        converted_path: Some("Recipes/Lathes/machines.json"),
        tag_policy: TagPolicy::IdKey,
        output_file: Some("Recipes/Lathes/machines.json"),
        wiki_page: None,
    },
    DataPath {
        alias: "recipes.by-recipe-ids",
        kind: DataPathKind::File,
        upstream_path: None,
        exclude: &[],
        input_path: None,
        converted_path: None,
        tag_policy: TagPolicy::Reject,
        output_file: Some("Recipes/recipes by recipe IDs.json"),
        wiki_page: Some("Module:Item recipe/recipes by recipe IDs.json"),
    },
    DataPath {
        alias: "recipes.recipe-ids-by-product-ids",
        kind: DataPathKind::File,
        upstream_path: None,
        exclude: &[],
        input_path: None,
        converted_path: None,
        tag_policy: TagPolicy::Reject,
        output_file: Some("Recipes/recipe IDs by product IDs.json"),
        wiki_page: Some("Module:Item recipe/recipe IDs by product IDs.json"),
    },
    DataPath {
        alias: "recipes.recipe-ids-by-method-and-availability",
        kind: DataPathKind::File,
        upstream_path: None,
        exclude: &[],
        input_path: None,
        converted_path: None,
        tag_policy: TagPolicy::Reject,
        output_file: Some("Recipes/recipe IDs by method and availability.json"),
        wiki_page: Some("Module:Item recipe/recipe IDs by method and availability.json"),
    },
    // ================
    // entities

    DataPath {
        alias: "entities.objects",
        kind: DataPathKind::Dir,
        upstream_path: Some("Resources/Prototypes/Entities/Objects"),
        exclude: &[],
        input_path: Some("Entities/Objects"),
        converted_path: Some("Entities/Objects"),
        tag_policy: TagPolicy::TypeKey,
        output_file: Some("Entities/PerSource/objects.json"),
        wiki_page: None,
    },
    DataPath {
        alias: "entities.clothing",
        kind: DataPathKind::Dir,
        upstream_path: Some("Resources/Prototypes/Entities/Clothing"),
        exclude: &[],
        input_path: Some("Entities/Clothing"),
        converted_path: Some("Entities/Clothing"),
        tag_policy: TagPolicy::TypeKey,
        output_file: Some("Entities/PerSource/clothing.json"),
        wiki_page: None,
    },
    DataPath {
        alias: "entities.structures",
        kind: DataPathKind::Dir,
        upstream_path: Some("Resources/Prototypes/Entities/Structures"),
        exclude: &[],
        input_path: Some("Entities/Structures"),
        converted_path: Some("Entities/Structures"),
        tag_policy: TagPolicy::TypeKey,
        output_file: Some("Entities/PerSource/structures.json"),
        wiki_page: None,
    },
    DataPath {
        alias: "entities.tiles",
        kind: DataPathKind::Dir,
        upstream_path: Some("Resources/Prototypes/Entities/Tiles"),
        exclude: &[],
        input_path: Some("Entities/Tiles"),
        converted_path: Some("Entities/Tiles"),
        tag_policy: TagPolicy::TypeKey,
        output_file: Some("Entities/PerSource/tiles.json"),
        wiki_page: None,
    },
    DataPath {
        alias: "entities.mobs",
        kind: DataPathKind::Dir,
        upstream_path: Some("Resources/Prototypes/Entities/Mobs"),
        exclude: &[],
        input_path: Some("Entities/Mobs"),
        converted_path: Some("Entities/Mobs"),
        tag_policy: TagPolicy::TypeKey,
        output_file: Some("Entities/PerSource/mobs.json"),
        wiki_page: None,
    },
    DataPath {
        alias: "entities.body.organs",
        kind: DataPathKind::Dir,
        upstream_path: Some("Resources/Prototypes/Body/Organs"),
        exclude: &[],
        input_path: Some("Entities/Body/Organs"),
        converted_path: Some("Entities/Body/Organs"),
        tag_policy: TagPolicy::TypeKey,
        output_file: Some("Entities/PerSource/body-organs.json"),
        wiki_page: None,
    },
    DataPath {
        alias: "entities.body.parts",
        kind: DataPathKind::Dir,
        upstream_path: Some("Resources/Prototypes/Body/Parts"),
        exclude: &[],
        input_path: Some("Entities/Body/Parts"),
        converted_path: Some("Entities/Body/Parts"),
        tag_policy: TagPolicy::TypeKey,
        output_file: Some("Entities/PerSource/body-parts.json"),
        wiki_page: None,
    },
    DataPath {
        alias: "entities.debugging",
        kind: DataPathKind::Dir,
        upstream_path: Some("Resources/Prototypes/Entities/Debugging"),
        exclude: &[],
        input_path: Some("Entities/Debugging"),
        converted_path: Some("Entities/Debugging"),
        tag_policy: TagPolicy::TypeKey,
        output_file: Some("Entities/PerSource/debugging.json"),
        wiki_page: None,
    },
    // container entities with their default contents
    DataPath {
        alias: "entities.catalog-fills",
        kind: DataPathKind::Dir,
        upstream_path: Some("Resources/Prototypes/Catalog/Fills"),
        exclude: &[],
        input_path: Some("Entities/Catalog/Fills"),
        converted_path: Some("Entities/Catalog/Fills"),
        tag_policy: TagPolicy::TypeKey,
        output_file: Some("Entities/PerSource/catalog-fills.json"),
        wiki_page: None,
    },
    // entity groups below exist only to be inherited from; they join
    // the resolution pool but never reach the published output
    DataPath {
        alias: "entities.foldable",
        kind: DataPathKind::File,
        upstream_path: Some("Resources/Prototypes/Entities/foldable.yml"),
        exclude: &[],
        input_path: Some("Entities/foldable.yml"),
        converted_path: Some("Entities/foldable.json"),
        tag_policy: TagPolicy::TypeKey,
        output_file: Some("Entities/PerSource/foldable.json"),
        wiki_page: None,
    },
    DataPath {
        alias: "entities.store-presets",
        kind: DataPathKind::File,
        upstream_path: Some("Resources/Prototypes/Store/presets.yml"),
        exclude: &[],
        input_path: Some("Entities/Store/presets.yml"),
        converted_path: Some("Entities/Store/presets.json"),
        tag_policy: TagPolicy::TypeKey,
        output_file: Some("Entities/PerSource/store-presets.json"),
        wiki_page: None,
    },
    DataPath {
        alias: "entities.inventory-templates",
        kind: DataPathKind::File,
        upstream_path: Some("Resources/Prototypes/InventoryTemplates/inventorybase.yml"),
        exclude: &[],
        input_path: Some("Entities/InventoryTemplates/inventorybase.yml"),
        converted_path: Some("Entities/InventoryTemplates/inventorybase.json"),
        tag_policy: TagPolicy::TypeKey,
        output_file: Some("Entities/PerSource/inventory-templates.json"),
        wiki_page: None,
    },
    DataPath {
        alias: "entities.markers",
        kind: DataPathKind::Dir,
        upstream_path: Some("Resources/Prototypes/Entities/Markers"),
        exclude: &[],
        input_path: Some("Entities/Markers"),
        converted_path: Some("Entities/Markers"),
        tag_policy: TagPolicy::TypeKey,
        output_file: Some("Entities/PerSource/markers.json"),
        wiki_page: None,
    },
    DataPath {
        alias: "entities.all-raw",
        kind: DataPathKind::File,
        upstream_path: None,
        exclude: &[],
        input_path: None,
        converted_path: None,
        tag_policy: TagPolicy::Reject,
        output_file: Some("Entities/all-entities-raw.json"),
        wiki_page: None,
    },
    DataPath {
        alias: "entities.processed",
        kind: DataPathKind::File,
        upstream_path: None,
        exclude: &[],
        input_path: None,
        converted_path: None,
        tag_policy: TagPolicy::Reject,
        output_file: Some("Entities/all-entities.json"),
        wiki_page: None,
    },
    // ================
    // items (entities + reagents combined)

    DataPath {
        alias: "items.names-by-ids",
        kind: DataPathKind::File,
        upstream_path: None,
        exclude: &[],
        input_path: None,
        converted_path: None,
        tag_policy: TagPolicy::Reject,
        output_file: Some("Items/item names by item ids.json"),
        wiki_page: Some("Module:Item/item names by item ids.json"),
    },
    DataPath {
        alias: "items.ids-by-lowercase-names",
        kind: DataPathKind::File,
        upstream_path: None,
        exclude: &[],
        input_path: None,
        converted_path: None,
        tag_policy: TagPolicy::Reject,
        output_file: Some("Items/item ids by item lowercase names.json"),
        wiki_page: Some("Module:Item/item ids by item lowercase names.json"),
    },
    // ================
    // reagents

    DataPath {
        alias: "reagents",
        kind: DataPathKind::Dir,
        upstream_path: Some("Resources/Prototypes/Reagents"),
        // materials are handled by their own tooling
        exclude: &["Materials"],
        input_path: Some("Reagents"),
        converted_path: Some("Reagents"),
        tag_policy: TagPolicy::TypeKey,
        output_file: Some("Reagents/reagents.json"),
        wiki_page: None,
    },
    // ================
    // research

    DataPath {
        alias: "research.techs",
        kind: DataPathKind::Dir,
        upstream_path: Some("Resources/Prototypes/Research"),
        // disciplines are their own data path
        exclude: &["disciplines.yml"],
        input_path: Some("Research/Techs"),
        converted_path: Some("Research/Techs"),
        tag_policy: TagPolicy::Reject,
        output_file: Some("Research/techs.json"),
        wiki_page: None,
    },
    DataPath {
        alias: "research.techs.processed",
        kind: DataPathKind::File,
        upstream_path: None,
        exclude: &[],
        input_path: None,
        converted_path: None,
        tag_policy: TagPolicy::Reject,
        output_file: Some("Research/techs by tech IDs by discipline IDs.json"),
        wiki_page: Some("Module:Research/techs by tech IDs by discipline IDs.json"),
    },
    DataPath {
        alias: "research.disciplines",
        kind: DataPathKind::File,
        upstream_path: Some("Resources/Prototypes/Research/disciplines.yml"),
        exclude: &[],
        input_path: Some("Research/Disciplines/disciplines.yml"),
        converted_path: Some("Research/Disciplines/disciplines.json"),
        tag_policy: TagPolicy::Reject,
        output_file: Some("Research/disciplines.json"),
        wiki_page: None,
    },
    DataPath {
        alias: "research.disciplines.processed",
        kind: DataPathKind::File,
        upstream_path: None,
        exclude: &[],
        input_path: None,
        converted_path: None,
        tag_policy: TagPolicy::Reject,
        output_file: Some("Research/disciplines by discipline IDs.json"),
        wiki_page: Some("Module:Research/disciplines by discipline IDs.json"),
    },
];

/// All data paths, in table order.
pub fn data_paths() -> &'static [DataPath] {
    DATA_PATHS
}

/// Look up a data path by alias.
pub fn data_path(alias: &str) -> Option<&'static DataPath> {
    DATA_PATHS.iter().find(|entry| entry.alias == alias)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn aliases_are_unique() {
        let mut seen = HashSet::new();
        for entry in data_paths() {
            assert!(seen.insert(entry.alias), "duplicate alias: {}", entry.alias);
        }
    }

    #[test]
    fn lookup_by_alias() {
        assert!(data_path("recipes.lathes").is_some());
        assert!(data_path("no.such.alias").is_none());
    }

    #[test]
    fn paths_are_relative() {
        for entry in data_paths() {
            for path in [
                entry.upstream_path,
                entry.input_path,
                entry.converted_path,
                entry.output_file,
            ]
            .into_iter()
            .flatten()
            {
                assert!(
                    !path.starts_with('/'),
                    "absolute path in '{}': {path}",
                    entry.alias
                );
            }
        }
    }

    #[test]
    fn importable_paths_have_input_locations() {
        for entry in data_paths() {
            if entry.upstream_path.is_some() {
                assert!(
                    entry.input_path.is_some(),
                    "'{}' imports but has no input path",
                    entry.alias
                );
            }
        }
    }

    #[test]
    fn published_paths_have_output_files() {
        for entry in data_paths() {
            if entry.wiki_page.is_some() {
                assert!(
                    entry.output_file.is_some(),
                    "'{}' publishes but has no output file",
                    entry.alias
                );
            }
        }
    }

    #[test]
    fn file_kind_converted_paths_end_in_json() {
        for entry in data_paths() {
            if entry.kind == DataPathKind::File {
                if let Some(converted) = entry.converted_path {
                    assert!(
                        converted.ends_with(".json"),
                        "'{}' converted file is not .json: {converted}",
                        entry.alias
                    );
                }
            }
        }
    }
}
