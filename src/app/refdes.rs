//! Reference designator parsing
//!
//! An OOI reference designator names one instrument, for example
//! `GI01SUMO-SBD11-01-FLORTD000`. Its four hyphen-delimited segments are
//! the subsite, the node and the two halves of the sensor. The array code is
//! the first two characters of the subsite.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{CatalogError, CatalogResult};

/// Number of hyphen-delimited segments in a reference designator
const SEGMENT_COUNT: usize = 4;

/// A reference designator split into its hierarchy levels
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReferenceDesignator {
    /// The full designator as published (e.g., "GI01SUMO-SBD11-01-FLORTD000")
    pub full: String,
    /// Array code (e.g., "GI")
    pub array_code: String,
    /// Subsite (e.g., "GI01SUMO")
    pub subsite: String,
    /// Node (e.g., "SBD11")
    pub node: String,
    /// Sensor (e.g., "01-FLORTD000")
    pub sensor: String,
}

impl ReferenceDesignator {
    /// Parse a designator into array, subsite, node and sensor
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::MalformedIdentifier` unless the designator has
    /// exactly four non-empty segments and a subsite of at least two characters.
    pub fn parse(refdes: &str) -> CatalogResult<Self> {
        let refdes = refdes.trim();
        let segments: Vec<&str> = refdes.split('-').collect();

        let malformed = || CatalogError::MalformedIdentifier {
            refdes: refdes.to_string(),
            segments: segments.len(),
        };

        if segments.len() != SEGMENT_COUNT || segments.iter().any(|s| s.is_empty()) {
            return Err(malformed());
        }

        let subsite = segments[0];
        let array_code = subsite.get(0..2).ok_or_else(malformed)?;

        Ok(Self {
            full: refdes.to_string(),
            array_code: array_code.to_string(),
            subsite: subsite.to_string(),
            node: segments[1].to_string(),
            sensor: format!("{}-{}", segments[2], segments[3]),
        })
    }

    /// Instrument path used in data request URLs: `{subsite}/{node}/{sensor}/`
    pub fn instrument_path(&self) -> String {
        format!("{}/{}/{}/", self.subsite, self.node, self.sensor)
    }

    /// Five-character instrument class (e.g., "FLORT" for "01-FLORTD000")
    ///
    /// Falls back to the whole instrument segment when the sensor is shorter
    /// than expected.
    pub fn instrument_class(&self) -> &str {
        self.sensor
            .get(3..8)
            .or_else(|| self.sensor.split_once('-').map(|(_, inst)| inst))
            .unwrap_or(&self.sensor)
    }
}

impl fmt::Display for ReferenceDesignator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl std::str::FromStr for ReferenceDesignator {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mooring_designator() {
        let rd = ReferenceDesignator::parse("GI01SUMO-SBD11-01-FLORTD000").unwrap();

        assert_eq!(rd.array_code, "GI");
        assert_eq!(rd.subsite, "GI01SUMO");
        assert_eq!(rd.node, "SBD11");
        assert_eq!(rd.sensor, "01-FLORTD000");
        assert_eq!(rd.full, "GI01SUMO-SBD11-01-FLORTD000");
    }

    #[test]
    fn test_instrument_path_reproduces_grouping() {
        let cases = [
            ("CE02SHSM", "RID27", "03", "CTDBPC000"),
            ("CP01CNSM", "MFD37", "03", "CTDBPD000"),
            ("GI01SUMO", "SBD11", "01", "FLORTD000"),
        ];

        for (subsite, node, port, inst) in cases {
            let refdes = format!("{}-{}-{}-{}", subsite, node, port, inst);
            let rd = ReferenceDesignator::parse(&refdes).unwrap();
            assert_eq!(
                rd.instrument_path(),
                format!("{}/{}/{}-{}/", subsite, node, port, inst)
            );
        }
    }

    #[test]
    fn test_malformed_designators_fail_loudly() {
        for bad in [
            "",
            "GI01SUMO",
            "GI01SUMO-SBD11-01",
            "GI01SUMO-SBD11-01-FLORTD000-EXTRA",
            "GI01SUMO--01-FLORTD000",
            "G-SBD11-01-FLORTD000",
        ] {
            let result = ReferenceDesignator::parse(bad);
            assert!(
                matches!(result, Err(CatalogError::MalformedIdentifier { .. })),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_malformed_reports_segment_count() {
        match ReferenceDesignator::parse("GI01SUMO-SBD11-01") {
            Err(CatalogError::MalformedIdentifier { segments, .. }) => assert_eq!(segments, 3),
            other => panic!("Expected MalformedIdentifier, got {:?}", other),
        }
    }

    #[test]
    fn test_instrument_class() {
        let rd = ReferenceDesignator::parse("CE04OSPS-SF01B-2A-CTDPFA107").unwrap();
        assert_eq!(rd.instrument_class(), "CTDPF");

        let short = ReferenceDesignator::parse("RS01SBPS-PC01A-4A-CTD").unwrap();
        assert_eq!(short.instrument_class(), "CTD");
    }

    #[test]
    fn test_from_str_and_display() {
        let rd: ReferenceDesignator = "CP02PMUO-WFP01-03-CTDPFK000".parse().unwrap();
        assert_eq!(rd.to_string(), "CP02PMUO-WFP01-03-CTDPFK000");
    }
}
