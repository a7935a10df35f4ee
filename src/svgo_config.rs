//! # SVGO Pipeline Configuration
//!
//! La pipeline di ottimizzazione è fissa: una lista ordinata di plugin SVGO
//! (nome, abilitato) più le opzioni di serializzazione `js2svg`.
//!
//! La configurazione viene costruita una volta all'avvio, condivisa in sola
//! lettura (`Arc<SvgoConfig>`) tra tutti i task e passata a SVGO così com'è:
//! il driver non interpreta né valida i nomi dei plugin.
//!
//! ## Formato JSON (SVGO 1.x):
//! ```json
//! {
//!   "js2svg": { "pretty": true, "indent": "  " },
//!   "plugins": [ { "cleanupAttrs": true }, { "removeDoctype": true }, ... ]
//! }
//! ```

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Ordered plugin toggles. Order matters: SVGO runs passes in list order.
const PIPELINE: &[(&str, bool)] = &[
    ("cleanupAttrs", true),
    ("removeDoctype", true),
    ("removeXMLProcInst", true),
    ("removeComments", true),
    ("removeMetadata", true),
    ("removeTitle", true),
    ("removeDesc", true),
    ("removeUselessDefs", true),
    ("removeEditorsNSData", true),
    ("removeEmptyAttrs", true),
    ("removeHiddenElems", true),
    ("removeEmptyText", true),
    ("removeEmptyContainers", true),
    ("removeViewBox", true),
    ("cleanUpEnableBackground", true),
    ("convertStyleToAttrs", true),
    ("convertColors", true),
    ("convertPathData", true),
    ("convertTransform", true),
    ("removeUnknownsAndDefaults", true),
    ("removeNonInheritableGroupAttrs", true),
    ("removeUselessStrokeAndFill", true),
    ("removeUnusedNS", true),
    ("cleanupIDs", true),
    ("cleanupNumericValues", true),
    ("moveElemsAttrsToGroup", true),
    ("moveGroupAttrsToElems", true),
    ("collapseGroups", true),
    ("removeRasterImages", false),
    ("mergePaths", true),
    ("convertShapeToPath", true),
    ("sortAttrs", false),
    ("transformsWithOnePath", true),
    ("removeDimensions", false),
];

/// A single named optimization pass and whether it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginToggle {
    pub name: &'static str,
    pub enabled: bool,
}

// SVGO expects each plugin as a single-key object: `{ "name": enabled }`.
impl Serialize for PluginToggle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.name, &self.enabled)?;
        map.end()
    }
}

/// Output formatting options (`js2svg` in SVGO terms)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Js2Svg {
    pub pretty: bool,
    pub indent: String,
}

/// Immutable SVGO configuration shared by every file task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SvgoConfig {
    js2svg: Js2Svg,
    plugins: Vec<PluginToggle>,
}

impl Default for SvgoConfig {
    fn default() -> Self {
        Self {
            js2svg: Js2Svg {
                pretty: true,
                indent: "  ".to_string(),
            },
            plugins: PIPELINE
                .iter()
                .map(|&(name, enabled)| PluginToggle { name, enabled })
                .collect(),
        }
    }
}

impl SvgoConfig {
    pub fn plugins(&self) -> &[PluginToggle] {
        &self.plugins
    }

    pub fn js2svg(&self) -> &Js2Svg {
        &self.js2svg
    }

    /// Names of the passes that will run, in order
    pub fn enabled_plugins(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.iter().filter(|p| p.enabled).map(|p| p.name)
    }

    /// Compact JSON accepted by `svgo --config`
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_pipeline_order_is_preserved() {
        let config = SvgoConfig::default();
        let names: Vec<_> = config.plugins().iter().map(|p| p.name).collect();
        assert_eq!(names.len(), 34);
        assert_eq!(names[0], "cleanupAttrs");
        assert_eq!(names[1], "removeDoctype");
        assert_eq!(names[2], "removeXMLProcInst");
        assert_eq!(names[3], "removeComments");
        assert_eq!(names[13], "removeViewBox");
        assert_eq!(names[33], "removeDimensions");
    }

    #[test]
    fn test_disabled_plugins() {
        let config = SvgoConfig::default();
        let disabled: Vec<_> = config
            .plugins()
            .iter()
            .filter(|p| !p.enabled)
            .map(|p| p.name)
            .collect();
        assert_eq!(disabled, vec!["removeRasterImages", "sortAttrs", "removeDimensions"]);
        assert_eq!(config.enabled_plugins().count(), 31);
    }

    #[test]
    fn test_json_shape() {
        let json = SvgoConfig::default().to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["js2svg"]["pretty"], Value::Bool(true));
        assert_eq!(value["js2svg"]["indent"], Value::String("  ".to_string()));

        let plugins = value["plugins"].as_array().unwrap();
        assert_eq!(plugins.len(), 34);
        assert_eq!(plugins[0], serde_json::json!({ "cleanupAttrs": true }));
        assert_eq!(plugins[28], serde_json::json!({ "removeRasterImages": false }));
        for plugin in plugins {
            assert_eq!(plugin.as_object().unwrap().len(), 1);
        }
    }

    #[test]
    fn test_plugin_names_are_unique() {
        let config = SvgoConfig::default();
        let mut names: Vec<_> = config.plugins().iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), config.plugins().len());
    }
}
