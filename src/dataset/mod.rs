//! Source dataset loading and time-bucketing.
//!
//! [`Dataset::load`] parses an OSM extract once, pipes the raw document
//! through the external `snap` capability, and holds the result read-only
//! for the whole run. A missing source document is "nothing to render", not
//! an error.

mod bucket;
mod datamap;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use anyhow::Context as _;
use tracing::debug;

pub use bucket::{Bucket, TITLE_BUCKET};
pub use datamap::CoordinateLine;

use crate::config::Config;
use crate::foundation::error::{LapseError, LapseResult};
use crate::toolchain::Toolchain;

/// File name of the snapped coordinate document under the working root.
pub const DATAMAP_FILE: &str = "datamap.txt";

/// One `<way>` element of the source document.
#[derive(Clone, Debug)]
pub struct Way {
    /// Feature id.
    pub id: String,
    /// Edit timestamp exactly as found in the document.
    pub timestamp: String,
    /// Opaque tag set from the `<tag>` children.
    pub tags: BTreeMap<String, String>,
    bucket: Bucket,
}

impl Way {
    /// The `YYYY-MM` bucket this way's timestamp normalizes to.
    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }
}

/// Document-level bounding box.
///
/// Attribute values are kept as the exact source strings: they only ever
/// flow back out onto the `render` command line, and a float round-trip
/// would perturb the original precision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bounds {
    /// Southern latitude.
    pub minlat: String,
    /// Western longitude.
    pub minlon: String,
    /// Northern latitude.
    pub maxlat: String,
    /// Eastern longitude.
    pub maxlon: String,
}

/// Parsed source document plus its snapped coordinate representation.
#[derive(Debug, Default)]
pub struct Dataset {
    ways: Vec<Way>,
    bounds: Option<Bounds>,
    datamap: Vec<CoordinateLine>,
}

impl Dataset {
    /// Load `source`, parse its ways and bounds, and snap it into
    /// `<work_root>/datamap.txt`.
    ///
    /// A missing source document yields an empty dataset without touching
    /// the filesystem. A malformed way timestamp is fatal here, at load
    /// time, before any frame work starts. A `snap` run that produces no
    /// output yields an empty coordinate set; a `snap` process failure is
    /// surfaced.
    pub fn load(source: &Path, toolchain: &dyn Toolchain, cfg: &Config) -> LapseResult<Self> {
        if !source.exists() {
            debug!(source = %source.display(), "source document missing, loading empty dataset");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(source)
            .with_context(|| format!("read source document '{}'", source.display()))?;
        let (ways, bounds) = parse_document(&text)?;

        std::fs::create_dir_all(&cfg.work_root)
            .with_context(|| format!("create working root '{}'", cfg.work_root.display()))?;
        let datamap_path = cfg.work_root.join(DATAMAP_FILE);
        toolchain.snap(source, &datamap_path)?;

        let datamap = if datamap_path.exists() {
            let snapped = std::fs::read_to_string(&datamap_path)
                .with_context(|| format!("read datamap '{}'", datamap_path.display()))?;
            datamap::parse_datamap(&snapped)?
        } else {
            Vec::new()
        };

        debug!(
            ways = ways.len(),
            coordinate_lines = datamap.len(),
            has_bounds = bounds.is_some(),
            "dataset loaded"
        );
        Ok(Self {
            ways,
            bounds,
            datamap,
        })
    }

    /// `true` when the dataset holds no features.
    pub fn is_empty(&self) -> bool {
        self.ways.is_empty()
    }

    /// All loaded ways, in document order.
    pub fn ways(&self) -> &[Way] {
        &self.ways
    }

    /// The document-level bounding box, if the source carried one.
    pub fn bounds(&self) -> Option<&Bounds> {
        self.bounds.as_ref()
    }

    /// Sorted distinct buckets over all way timestamps, ascending.
    pub fn buckets(&self) -> Vec<Bucket> {
        self.ways
            .iter()
            .map(|way| way.bucket().clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Ids of the ways bucketed into `bucket`, in document order.
    pub fn feature_ids_for(&self, bucket: &Bucket) -> Vec<&str> {
        self.ways
            .iter()
            .filter(|way| way.bucket() == bucket)
            .map(|way| way.id.as_str())
            .collect()
    }

    /// Coordinate lines whose embedded id belongs to `bucket`, preserving
    /// the snap output order (not feature order).
    pub fn coordinates_for(&self, bucket: &Bucket) -> Vec<&CoordinateLine> {
        let ids: HashSet<&str> = self.feature_ids_for(bucket).into_iter().collect();
        self.datamap
            .iter()
            .filter(|line| ids.contains(line.feature_id()))
            .collect()
    }
}

fn parse_document(text: &str) -> LapseResult<(Vec<Way>, Option<Bounds>)> {
    let doc = roxmltree::Document::parse(text)
        .map_err(|e| LapseError::dataset(format!("malformed source document: {e}")))?;

    let bounds = doc
        .descendants()
        .find(|node| node.has_tag_name("bounds"))
        .map(|node| -> LapseResult<Bounds> {
            Ok(Bounds {
                minlat: bounds_attr(&node, "minlat")?,
                minlon: bounds_attr(&node, "minlon")?,
                maxlat: bounds_attr(&node, "maxlat")?,
                maxlon: bounds_attr(&node, "maxlon")?,
            })
        })
        .transpose()?;

    let mut ways = Vec::new();
    for node in doc.descendants().filter(|n| n.has_tag_name("way")) {
        let id = node
            .attribute("id")
            .ok_or_else(|| LapseError::dataset("way element without id"))?
            .to_string();
        let timestamp = node
            .attribute("timestamp")
            .ok_or_else(|| LapseError::dataset(format!("way {id} without timestamp")))?
            .to_string();
        let bucket = Bucket::from_timestamp(&timestamp)?;
        let tags = node
            .children()
            .filter(|child| child.has_tag_name("tag"))
            .filter_map(|child| {
                Some((
                    child.attribute("k")?.to_string(),
                    child.attribute("v")?.to_string(),
                ))
            })
            .collect();
        ways.push(Way {
            id,
            timestamp,
            tags,
            bucket,
        });
    }
    Ok((ways, bounds))
}

fn bounds_attr(node: &roxmltree::Node<'_, '_>, name: &str) -> LapseResult<String> {
    node.attribute(name)
        .map(str::to_string)
        .ok_or_else(|| LapseError::dataset(format!("bounds element without {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::InMemoryToolchain;

    fn write_source(dir: &Path, xml: &str) -> std::path::PathBuf {
        let path = dir.join("extract.osm");
        std::fs::write(&path, xml).unwrap();
        path
    }

    fn two_month_doc() -> String {
        r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <bounds minlat="-34.0537260" minlon="20.4114820" maxlat="-34.0094830" maxlon="20.4673580"/>
  <way id="100" timestamp="2010-01-06T12:00:00Z">
    <tag k="highway" v="residential"/>
  </way>
  <way id="101" timestamp="2010-01-20T08:30:00Z"/>
  <way id="200" timestamp="2010-03-02T17:45:00Z">
    <tag k="highway" v="trunk"/>
    <tag k="ref" v="N2"/>
  </way>
</osm>
"#
        .to_string()
    }

    fn snap_lines() -> String {
        // Within 2010-01 the snap order (101 before 100) deliberately
        // differs from document order.
        [
            "-34.1,20.1 -34.2,20.2 // id=200;highway=trunk;ref=N2",
            "-34.3,20.3 -34.4,20.4 // id=101",
            "-34.5,20.5 -34.6,20.6 // id=100;highway=residential",
        ]
        .join("\n")
    }

    #[test]
    fn missing_source_document_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            work_root: dir.path().join("work"),
            ..Config::default()
        };
        let toolchain = InMemoryToolchain::new();

        let dataset =
            Dataset::load(&dir.path().join("unknown.osm"), &toolchain, &cfg).unwrap();
        assert!(dataset.is_empty());
        assert!(dataset.bounds().is_none());
        assert!(dataset.buckets().is_empty());
        // Nothing staged, snap never ran.
        assert!(!cfg.work_root.exists());
        assert!(toolchain.calls().is_empty());
    }

    #[test]
    fn load_parses_ways_bounds_and_datamap() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            work_root: dir.path().join("work"),
            ..Config::default()
        };
        let source = write_source(dir.path(), &two_month_doc());
        let toolchain = InMemoryToolchain::new().with_snap_output(snap_lines());

        let dataset = Dataset::load(&source, &toolchain, &cfg).unwrap();
        assert_eq!(dataset.ways().len(), 3);
        assert_eq!(
            dataset.ways()[0].tags.get("highway").map(String::as_str),
            Some("residential")
        );
        let bounds = dataset.bounds().unwrap();
        assert_eq!(bounds.minlat, "-34.0537260");
        assert_eq!(bounds.maxlon, "20.4673580");
        assert!(cfg.work_root.join(DATAMAP_FILE).exists());
    }

    #[test]
    fn buckets_are_sorted_and_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            work_root: dir.path().join("work"),
            ..Config::default()
        };
        let source = write_source(dir.path(), &two_month_doc());
        let toolchain = InMemoryToolchain::new().with_snap_output(snap_lines());

        let dataset = Dataset::load(&source, &toolchain, &cfg).unwrap();
        let buckets = dataset.buckets();
        assert_eq!(
            buckets.iter().map(Bucket::as_str).collect::<Vec<_>>(),
            ["2010-01", "2010-03"]
        );
    }

    #[test]
    fn coordinates_preserve_snap_order_not_feature_order() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            work_root: dir.path().join("work"),
            ..Config::default()
        };
        let source = write_source(dir.path(), &two_month_doc());
        let toolchain = InMemoryToolchain::new().with_snap_output(snap_lines());

        let dataset = Dataset::load(&source, &toolchain, &cfg).unwrap();
        let january = Bucket::from_timestamp("2010-01-01T00:00:00Z").unwrap();

        let ids = dataset.feature_ids_for(&january);
        assert_eq!(ids, ["100", "101"]); // document order

        let lines = dataset.coordinates_for(&january);
        assert_eq!(lines.len(), ids.len());
        let line_ids: Vec<_> = lines.iter().map(|l| l.feature_id()).collect();
        assert_eq!(line_ids, ["101", "100"]); // snap order
    }

    #[test]
    fn empty_snap_output_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            work_root: dir.path().join("work"),
            ..Config::default()
        };
        let source = write_source(dir.path(), &two_month_doc());
        let toolchain = InMemoryToolchain::new();

        let dataset = Dataset::load(&source, &toolchain, &cfg).unwrap();
        let january = Bucket::from_timestamp("2010-01-01T00:00:00Z").unwrap();
        assert!(dataset.coordinates_for(&january).is_empty());
    }

    #[test]
    fn malformed_way_timestamp_is_fatal_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            work_root: dir.path().join("work"),
            ..Config::default()
        };
        let xml = r#"<osm><way id="1" timestamp="whenever"/></osm>"#;
        let source = write_source(dir.path(), xml);
        let toolchain = InMemoryToolchain::new();

        let err = Dataset::load(&source, &toolchain, &cfg).unwrap_err();
        assert!(matches!(err, LapseError::Timestamp(_)));
    }

    #[test]
    fn way_without_id_is_a_dataset_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            work_root: dir.path().join("work"),
            ..Config::default()
        };
        let xml = r#"<osm><way timestamp="2010-01-06T12:00:00Z"/></osm>"#;
        let source = write_source(dir.path(), xml);
        let toolchain = InMemoryToolchain::new();

        let err = Dataset::load(&source, &toolchain, &cfg).unwrap_err();
        assert!(matches!(err, LapseError::Dataset(_)));
    }
}
