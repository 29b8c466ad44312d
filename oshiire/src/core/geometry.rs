use std::collections::HashMap;

use crate::core::config::Config;
use crate::wm::Rect;

/// Geometry applied to tags with no configured or saved value.
const DEFAULT_GEOM: &str = "800x600+100+100";

/// Per-tag geometry strings ("WxH+X+Y"), seeded from configuration and
/// updated by `save` so restores pick up new values without a reload.
#[derive(Debug, Default)]
pub struct GeometryStore {
    geoms: HashMap<String, String>,
}

impl GeometryStore {
    pub fn from_config(config: &Config) -> Self {
        let geoms = config
            .tags
            .iter()
            .filter_map(|t| t.geom.clone().map(|g| (t.name.clone(), g)))
            .collect();
        Self { geoms }
    }

    pub fn get(&self, tag: &str) -> &str {
        self.geoms.get(tag).map(String::as_str).unwrap_or(DEFAULT_GEOM)
    }

    pub fn set(&mut self, tag: &str, geom: String) {
        self.geoms.insert(tag.to_string(), geom);
    }

    /// Command fragment applying the tag's geometry.
    pub fn command(&self, tag: &str) -> String {
        render(self.get(tag))
            .or_else(|| render(DEFAULT_GEOM))
            .expect("default geometry renders")
    }
}

pub fn format_geom(rect: Rect) -> String {
    format!("{}x{}+{}+{}", rect.width, rect.height, rect.x, rect.y)
}

pub fn parse_geom(s: &str) -> Option<Rect> {
    let (size, pos) = s.split_once('+')?;
    let (w, h) = size.split_once('x')?;
    let (x, y) = pos.split_once('+')?;
    Some(Rect {
        x: x.parse().ok()?,
        y: y.parse().ok()?,
        width: w.parse().ok()?,
        height: h.parse().ok()?,
    })
}

fn render(geom: &str) -> Option<String> {
    let rect = parse_geom(geom)?;
    Some(format!(
        "resize set {} {}, move absolute position {} {}",
        rect.width, rect.height, rect.x, rect.y
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TagConfig;

    #[test]
    fn test_format_parse_roundtrip() {
        let rect = Rect {
            x: 11,
            y: 15,
            width: 1898,
            height: 1036,
        };
        assert_eq!(format_geom(rect), "1898x1036+11+15");
        assert_eq!(parse_geom("1898x1036+11+15"), Some(rect));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_geom("1898x1036").is_none());
        assert!(parse_geom("wide+11+15").is_none());
        assert!(parse_geom("").is_none());
    }

    #[test]
    fn test_store_falls_back_to_default() {
        let store = GeometryStore::default();
        assert_eq!(store.get("term"), DEFAULT_GEOM);
        assert_eq!(
            store.command("term"),
            "resize set 800 600, move absolute position 100 100"
        );
    }

    #[test]
    fn test_store_seeded_from_config_and_updated() {
        let config = Config {
            autosave_interval_ms: None,
            tags: vec![TagConfig {
                name: "term".to_string(),
                geom: Some("1000x500+5+7".to_string()),
                ..Default::default()
            }],
        };
        let mut store = GeometryStore::from_config(&config);
        assert_eq!(store.get("term"), "1000x500+5+7");
        assert_eq!(
            store.command("term"),
            "resize set 1000 500, move absolute position 5 7"
        );

        store.set("term", "640x480+0+0".to_string());
        assert_eq!(store.get("term"), "640x480+0+0");
    }

    #[test]
    fn test_unparsable_saved_geom_renders_default() {
        let mut store = GeometryStore::default();
        store.set("term", "broken".to_string());
        assert_eq!(
            store.command("term"),
            "resize set 800 600, move absolute position 100 100"
        );
    }
}
