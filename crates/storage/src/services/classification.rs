//! Classification thresholds for the ArcheryGB and NFAA systems.
//!
//! Read-only reference data keyed by round-type display name. Thresholds are
//! ordered highest first; a score earns the first threshold it meets.

const ARCHERY_GB: &str = "ArcheryGB";
const NFAA: &str = "NFAA";

const WA_720_70M: &[(i32, &str)] = &[
    (625, "Grand Master Bowman"),
    (575, "Master Bowman"),
    (525, "Bowman 1st Class"),
    (475, "Bowman 2nd Class"),
    (400, "Bowman 3rd Class"),
    (300, "Archer 1st Class"),
    (200, "Archer 2nd Class"),
    (100, "Archer 3rd Class"),
];

const WA_720_60M: &[(i32, &str)] = &[
    (640, "Grand Master Bowman"),
    (590, "Master Bowman"),
    (540, "Bowman 1st Class"),
    (490, "Bowman 2nd Class"),
    (420, "Bowman 3rd Class"),
    (320, "Archer 1st Class"),
    (220, "Archer 2nd Class"),
    (120, "Archer 3rd Class"),
];

const WA_18M_60_ARROWS: &[(i32, &str)] = &[
    (550, "Grand Master Bowman"),
    (510, "Master Bowman"),
    (470, "Bowman 1st Class"),
    (420, "Bowman 2nd Class"),
    (350, "Bowman 3rd Class"),
    (270, "Archer 1st Class"),
    (180, "Archer 2nd Class"),
    (90, "Archer 3rd Class"),
];

const NFAA_300_INDOOR: &[(i32, &str)] = &[
    (290, "Expert"),
    (270, "Sharpshooter"),
    (240, "Marksman"),
    (200, "Bowman"),
];

const NFAA_300_OUTDOOR: &[(i32, &str)] = &[
    (280, "Expert"),
    (260, "Sharpshooter"),
    (230, "Marksman"),
    (190, "Bowman"),
];

/// A classification awarded for a score on a given round type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub system: &'static str,
    pub label: &'static str,
}

fn thresholds_for(round_type: &str) -> Option<(&'static str, &'static [(i32, &'static str)])> {
    match round_type {
        "WA 720 (70m)" => Some((ARCHERY_GB, WA_720_70M)),
        "WA 720 (60m)" => Some((ARCHERY_GB, WA_720_60M)),
        "WA 18m Round (60 arrows)" => Some((ARCHERY_GB, WA_18M_60_ARROWS)),
        "NFAA 300 Indoor" => Some((NFAA, NFAA_300_INDOOR)),
        "NFAA 300 Outdoor" => Some((NFAA, NFAA_300_OUTDOOR)),
        _ => None,
    }
}

/// Returns the highest classification the score meets for the round type,
/// or `None` when the round type has no table or no threshold is met.
pub fn classify(score: i32, round_type: &str) -> Option<Classification> {
    let (system, thresholds) = thresholds_for(round_type)?;

    thresholds
        .iter()
        .find(|(threshold, _)| score >= *threshold)
        .map(|(_, label)| Classification { system, label })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_round_mid_band() {
        let result = classify(580, "WA 720 (70m)").unwrap();
        assert_eq!(result.system, "ArcheryGB");
        assert_eq!(result.label, "Master Bowman");
    }

    #[test]
    fn test_exact_threshold_is_met() {
        let result = classify(625, "WA 720 (70m)").unwrap();
        assert_eq!(result.label, "Grand Master Bowman");
    }

    #[test]
    fn test_one_below_threshold_falls_through() {
        let result = classify(624, "WA 720 (70m)").unwrap();
        assert_eq!(result.label, "Master Bowman");
    }

    #[test]
    fn test_below_lowest_threshold() {
        assert_eq!(classify(99, "WA 720 (70m)"), None);
    }

    #[test]
    fn test_unknown_round_type() {
        assert_eq!(classify(500, "Unknown Round"), None);
    }

    #[test]
    fn test_nfaa_system() {
        let result = classify(290, "NFAA 300 Indoor").unwrap();
        assert_eq!(result.system, "NFAA");
        assert_eq!(result.label, "Expert");

        let result = classify(195, "NFAA 300 Outdoor").unwrap();
        assert_eq!(result.label, "Bowman");
    }
}
