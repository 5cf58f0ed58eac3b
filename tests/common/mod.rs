//! Shared fixture: a synthetic extract shaped like a small town's edit
//! history (333 ways spanning 32 months, 9 of them edited in 2010-01),
//! plus the matching snapped datamap a `snap` run would produce.
#![allow(dead_code)]

/// Id of the first way edited in 2010-01 (and of the whole document).
pub const FIRST_JANUARY_ID: u64 = 47587914;

/// The 32 `YYYY-MM` keys covered by the fixture, ascending.
pub fn month_keys() -> Vec<String> {
    let mut keys = Vec::new();
    for year in 2010..=2012 {
        let last = if year == 2012 { 8 } else { 12 };
        for month in 1..=last {
            keys.push(format!("{year}-{month:02}"));
        }
    }
    keys
}

/// Ways per month: 9 in the first month, then 11s and 10s summing to 333.
fn way_counts(months: usize) -> Vec<usize> {
    let mut counts = vec![0; months];
    counts[0] = 9;
    for (i, count) in counts.iter_mut().enumerate().skip(1) {
        *count = if i <= 14 { 11 } else { 10 };
    }
    counts
}

/// A generated source document and its snapped coordinate lines.
pub struct Fixture {
    /// OSM XML with bounds and 333 ways.
    pub osm: String,
    /// Snap output: one line per way, months in *reverse* order so that the
    /// datamap order visibly differs from document order.
    pub datamap: String,
    /// Total way count (333).
    pub total_ways: usize,
}

/// Build the fixture.
pub fn swellendam_like() -> Fixture {
    let keys = month_keys();
    let counts = way_counts(keys.len());

    let mut next_id = FIRST_JANUARY_ID;
    let mut ways_xml = String::new();
    let mut month_lines: Vec<Vec<String>> = Vec::new();
    let mut total_ways = 0;

    for (key, count) in keys.iter().zip(&counts) {
        let mut lines = Vec::new();
        for day in 0..*count {
            let id = next_id;
            next_id += 1;
            total_ways += 1;
            let timestamp = format!("{key}-{:02}T10:00:00Z", day + 1);
            ways_xml.push_str(&format!(
                "  <way id=\"{id}\" timestamp=\"{timestamp}\">\n    \
                 <tag k=\"highway\" v=\"residential\"/>\n    \
                 <tag k=\"name\" v=\"Street {id}\"/>\n  </way>\n"
            ));
            lines.push(format!(
                "-34.029976,20.431830 -34.030593,20.432838 \
                 // id={id};highway=residential;name=Street {id}"
            ));
        }
        month_lines.push(lines);
    }

    let mut datamap = String::new();
    for lines in month_lines.iter().rev() {
        for line in lines {
            datamap.push_str(line);
            datamap.push('\n');
        }
    }

    let osm = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <osm version=\"0.6\">\n  \
         <bounds minlat=\"-34.0537260\" minlon=\"20.4114820\" \
         maxlat=\"-34.0094830\" maxlon=\"20.4673580\"/>\n\
         {ways_xml}</osm>\n"
    );

    Fixture {
        osm,
        datamap,
        total_ways,
    }
}
