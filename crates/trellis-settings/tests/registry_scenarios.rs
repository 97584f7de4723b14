//! End-to-end scenarios exercising the registry through its public API.

use std::sync::Arc;

use trellis_settings::{
    EntryDef, MemoryStore, NamedListOptions, Origin, SettingsEntry, SettingsKind, SettingsRegistry,
    SettingsTreeDebug, SettingsType, SettingsValue,
};

fn registry() -> SettingsRegistry {
    SettingsRegistry::new(Arc::new(MemoryStore::new()))
}

/// A typical application layout: a static section plus a named list of
/// connections nested inside a named list of profiles.
struct AppSettings {
    registry: SettingsRegistry,
    profiles: trellis_settings::NodeId,
    connections: trellis_settings::NodeId,
    theme: SettingsEntry<String>,
    url: SettingsEntry<String>,
    timeout: SettingsEntry<i64>,
}

fn build_app_settings() -> AppSettings {
    let mut registry = registry();
    let root = registry.root();

    let ui = registry.create_child_node(root, "ui").unwrap();
    let theme = registry
        .register_entry(
            ui,
            EntryDef::new("theme", String::from("light")).description("UI color theme"),
        )
        .unwrap();

    let profiles = registry
        .create_named_list_node(root, "profiles", NamedListOptions { selected_item: true })
        .unwrap();
    let connections = registry
        .create_named_list_node(profiles, "connections", NamedListOptions::default())
        .unwrap();
    let url = registry
        .register_entry(connections, EntryDef::new("url", String::new()))
        .unwrap();
    let timeout = registry
        .register_entry(
            connections,
            EntryDef::new("timeout", 30i64).check(|v| *v > 0),
        )
        .unwrap();

    AppSettings {
        registry,
        profiles,
        connections,
        theme,
        url,
        timeout,
    }
}

#[test]
fn nested_named_lists_resolve_per_combination() {
    let app = build_app_settings();
    let registry = &app.registry;

    app.url
        .set_value_for(registry, "https://work.example".to_string(), &["work", "db"])
        .unwrap();
    app.timeout
        .set_value_for(registry, 5, &["work", "db"])
        .unwrap();
    app.url
        .set_value_for(registry, "https://home.example".to_string(), &["home", "db"])
        .unwrap();

    // Same logical setting, one value per combination of parts.
    assert_eq!(
        app.url.value_for(registry, &["work", "db"]).unwrap(),
        "https://work.example"
    );
    assert_eq!(
        app.url.value_for(registry, &["home", "db"]).unwrap(),
        "https://home.example"
    );
    assert_eq!(app.timeout.value_for(registry, &["home", "db"]).unwrap(), 30);

    // Outer enumeration takes no parts, inner takes the outer item name.
    assert_eq!(
        registry.items(app.profiles, &[]).unwrap(),
        vec!["home".to_string(), "work".to_string()]
    );
    assert_eq!(
        registry.items(app.connections, &["work"]).unwrap(),
        vec!["db".to_string()]
    );
}

#[test]
fn deleting_an_outer_item_removes_nested_values() {
    let app = build_app_settings();
    let registry = &app.registry;

    app.url
        .set_value_for(registry, "https://a".to_string(), &["work", "db"])
        .unwrap();
    app.url
        .set_value_for(registry, "https://b".to_string(), &["work", "cache"])
        .unwrap();
    app.url
        .set_value_for(registry, "https://c".to_string(), &["home", "db"])
        .unwrap();

    registry.delete_item(app.profiles, "work", &[]).unwrap();

    assert_eq!(registry.items(app.profiles, &[]).unwrap(), vec!["home".to_string()]);
    assert!(registry.items(app.connections, &["work"]).unwrap().is_empty());
    assert_eq!(
        app.url.value_for(registry, &["home", "db"]).unwrap(),
        "https://c"
    );
}

#[test]
fn selected_profile_survives_item_churn() {
    let app = build_app_settings();
    let registry = &app.registry;

    app.timeout.set_value_for(registry, 5, &["work", "db"]).unwrap();
    registry.set_selected_item(app.profiles, "work", &[]).unwrap();
    assert_eq!(registry.selected_item(app.profiles, &[]).unwrap(), "work");

    // Deleting item values does not clear the selection; callers decide what
    // a dangling selection means.
    registry.delete_item(app.profiles, "work", &[]).unwrap();
    assert_eq!(registry.selected_item(app.profiles, &[]).unwrap(), "work");
}

#[test]
fn global_layer_provides_defaults_until_overridden() {
    let store = Arc::new(MemoryStore::new());
    store.set_value_in(
        Origin::Global,
        "ui/theme",
        SettingsValue::from("corporate"),
    );

    let mut registry = SettingsRegistry::new(store);
    let ui = registry.create_child_node(registry.root(), "ui").unwrap();
    let theme = registry
        .register_entry(ui, EntryDef::new("theme", String::from("light")))
        .unwrap();

    assert_eq!(theme.value(&registry).unwrap(), "corporate");
    assert_eq!(theme.origin(&registry, &[]).unwrap(), Origin::Global);

    theme.set_value(&registry, "dark".to_string()).unwrap();
    assert_eq!(theme.value(&registry).unwrap(), "dark");
    assert_eq!(theme.origin(&registry, &[]).unwrap(), Origin::Local);
}

#[test]
fn legacy_key_migration_with_dynamic_parts() {
    let app = build_app_settings();
    let registry = &app.registry;

    // A value written by an older release under a different layout.
    registry
        .store()
        .set_value("legacy/work/db/url", SettingsValue::from("https://old"));

    let migrated = app
        .url
        .copy_value_from_key(registry, "legacy/%1/%2/url", &["work", "db"], true)
        .unwrap();
    assert!(migrated);
    assert_eq!(
        app.url.value_for(registry, &["work", "db"]).unwrap(),
        "https://old"
    );
    assert!(!registry.store().contains("legacy/work/db/url"));
}

#[test]
fn unregistering_a_section_cleans_the_store() {
    let app = build_app_settings();

    app.theme
        .set_value(&app.registry, "dark".to_string())
        .unwrap();
    app.url
        .set_value_for(&app.registry, "https://a".to_string(), &["work", "db"])
        .unwrap();
    app.registry
        .set_selected_item(app.profiles, "work", &[])
        .unwrap();

    let mut registry = app.registry;
    registry.unregister_node(app.profiles, true).unwrap();

    assert!(!registry.tree().contains_node(app.profiles));
    assert!(!registry.store().contains("profiles/items/work/connections/items/db/url"));
    assert!(!registry.store().contains("profiles/selected"));
    // Unrelated sections are untouched.
    assert_eq!(
        registry.store().value("ui/theme"),
        Some(SettingsValue::from("dark"))
    );
}

#[test]
fn tree_debug_formatting_shows_the_layout() {
    let app = build_app_settings();
    let output = SettingsTreeDebug::new(app.registry.tree())
        .format_all()
        .unwrap();

    assert!(output.contains("ui"));
    assert!(output.contains("theme: String"));
    assert!(output.contains("profiles/items/*"));
    assert!(output.contains("connections/items/*"));
    assert!(output.contains("timeout: Integer"));
}

/// Domain types plug in by serializing through a built-in representation.
#[derive(Clone, Debug, PartialEq)]
enum Compression {
    Off,
    Fast,
    Best,
}

impl SettingsType for Compression {
    const KIND: SettingsKind = SettingsKind::Custom;

    fn into_value(self) -> SettingsValue {
        SettingsValue::from(match self {
            Self::Off => "off",
            Self::Fast => "fast",
            Self::Best => "best",
        })
    }

    fn from_value(value: &SettingsValue) -> Option<Self> {
        match value.as_string()?.as_str() {
            "off" => Some(Self::Off),
            "fast" => Some(Self::Fast),
            "best" => Some(Self::Best),
            _ => None,
        }
    }
}

#[test]
fn custom_settings_type_round_trips_and_falls_back() {
    let mut registry = registry();
    let node = registry.create_child_node(registry.root(), "export").unwrap();
    let compression = registry
        .register_entry(node, EntryDef::new("compression", Compression::Fast))
        .unwrap();

    assert_eq!(compression.value(&registry).unwrap(), Compression::Fast);

    compression.set_value(&registry, Compression::Best).unwrap();
    assert_eq!(compression.value(&registry).unwrap(), Compression::Best);

    // An unknown stored token falls back to the default.
    registry
        .store()
        .set_value("export/compression", SettingsValue::from("turbo"));
    assert_eq!(compression.value(&registry).unwrap(), Compression::Fast);
}

#[test]
fn detached_entries_coexist_with_the_tree() {
    let mut registry = registry();
    let plugins_enabled = registry
        .register_detached_entry(
            EntryDef::new("plugins/%1/enabled", false).description("Whether a plugin is active"),
        )
        .unwrap();

    plugins_enabled
        .set_value_for(&registry, true, &["mesh"])
        .unwrap();
    assert!(plugins_enabled.value_for(&registry, &["mesh"]).unwrap());

    // Detached entries do not appear under the root.
    assert!(registry.tree().children_settings(registry.root()).unwrap().is_empty());
}
