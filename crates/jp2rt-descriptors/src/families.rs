use serde::ser::{Serialize, Serializer};

use crate::engine::DescriptorFamily;
use crate::error::Result;

/// Families as an ordered JSON object of `name -> [descriptor, ...]`.
struct Listing<'a>(&'a [DescriptorFamily]);

impl Serialize for Listing<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|f| (&f.name, &f.descriptors)))
    }
}

/// Render a descriptor listing.
///
/// The text form prints every family name followed by its descriptors, one per
/// line, tab-indented and numbered from 1 across all families. The JSON form
/// is a pretty-printed object keeping family order.
pub fn format_families(families: &[DescriptorFamily], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(&Listing(families))?);
    }
    let mut out = String::new();
    let mut n = 1;
    for family in families {
        out.push_str(&family.name);
        out.push('\n');
        for descriptor in &family.descriptors {
            out.push_str(&format!("\t{}: {}\n", n, descriptor));
            n += 1;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn families() -> Vec<DescriptorFamily> {
        vec![
            DescriptorFamily {
                name: "Weight".to_string(),
                descriptors: vec!["MW".to_string()],
            },
            DescriptorFamily {
                name: "AtomCount".to_string(),
                descriptors: vec!["nAtom".to_string(), "nC".to_string()],
            },
        ]
    }

    #[test]
    fn test_text_numbering_spans_families() {
        assert_eq!(
            format_families(&families(), false).unwrap(),
            "Weight\n\t1: MW\nAtomCount\n\t2: nAtom\n\t3: nC\n"
        );
    }

    #[test]
    fn test_json_keeps_order() {
        let json = format_families(&families(), true).unwrap();
        let weight = json.find("\"Weight\"").unwrap();
        let atoms = json.find("\"AtomCount\"").unwrap();
        assert!(weight < atoms);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["AtomCount"][1], "nC");
    }
}
