//! Static catalog of questionnaire feature groups.
//!
//! Maps a feature-group code (`"1.1"`, `"2.1.3"`, ...) to its display name,
//! the labels of its levels and the rationale shown next to a
//! recommendation. The first sixteen entries make up the standard
//! questionnaire; the extended codes only carry names and rationales.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Display metadata for one feature group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureInfo {
    pub code: &'static str,
    pub name: &'static str,
    /// Level labels, indexed by level. Empty for extended codes.
    pub options: &'static [&'static str],
    pub description: &'static str,
}

const YES_NO_UNSURE: &[&str] = &["Yes", "No", "Unsure"];
const TEAM_COUNTS: &[&str] = &["≤10", "11-20", "21-30", "31-40", ">40", "N/A"];
const PERCENT_BANDS: &[&str] = &["≤20%", "21-40%", "41-60%", "61-80%", "81-100%"];

/// The sixteen groups of the standard questionnaire, in input order
pub static STANDARD_FEATURES: &[FeatureInfo] = &[
    FeatureInfo {
        code: "1.1",
        name: "Project Duration",
        options: &["≤3 months", "3-6 months", "6-12 months", "12-24 months", ">24 months"],
        description:
            "Optimize project duration to balance security implementation with project timeline",
    },
    FeatureInfo {
        code: "1.2",
        name: "Project Type",
        options: &[
            "Transportation",
            "Government",
            "Healthcare",
            "Commercial",
            "Residential",
            "Other",
        ],
        description:
            "Adjust project type classification to better align with security requirements",
    },
    FeatureInfo {
        code: "1.3",
        name: "Cybersecurity Legal Team",
        options: YES_NO_UNSURE,
        description: "Establish a dedicated cybersecurity legal team to ensure compliance and guide legal requirements",
    },
    FeatureInfo {
        code: "1.4",
        name: "Company Scale",
        options: &["≤30", "31-60", "61-100", "101-150", ">150"],
        description: "Scale organizational resources to support comprehensive cybersecurity measures",
    },
    FeatureInfo {
        code: "1.5",
        name: "Project Phase",
        options: &["Planning", "Design", "Construction", "Maintenance", "Demolition"],
        description: "Align security measures with current project phase requirements",
    },
    FeatureInfo {
        code: "2.1.1",
        name: "Layer 1 Teams",
        options: TEAM_COUNTS,
        description:
            "Expand core project teams to improve security oversight and resource allocation",
    },
    FeatureInfo {
        code: "2.1.2",
        name: "Layer 2 Teams",
        options: TEAM_COUNTS,
        description: "Optimize secondary team structure for better security coordination",
    },
    FeatureInfo {
        code: "2.1.3",
        name: "Layer 3 Teams",
        options: TEAM_COUNTS,
        description: "Adjust tertiary team arrangements to minimize security gaps",
    },
    FeatureInfo {
        code: "2.2",
        name: "Team Overlap Percentage",
        options: PERCENT_BANDS,
        description: "Reduce team overlap to minimize shared security vulnerabilities",
    },
    FeatureInfo {
        code: "3.1",
        name: "Dedicated IT Team",
        options: YES_NO_UNSURE,
        description: "Establish a dedicated IT team for proactive security management",
    },
    FeatureInfo {
        code: "3.2",
        name: "Devices with Firewall",
        options: PERCENT_BANDS,
        description: "Increase firewall deployment across all project devices",
    },
    FeatureInfo {
        code: "3.3",
        name: "Network Type",
        options: &["Public", "Private", "Both"],
        description: "Transition to more secure network infrastructure",
    },
    FeatureInfo {
        code: "3.4",
        name: "Phishing Test Failure Rate",
        options: PERCENT_BANDS,
        description: "Improve security awareness training to reduce susceptibility to phishing attacks",
    },
    FeatureInfo {
        code: "4.1",
        name: "Governance Level",
        options: &["Level 1", "Level 2", "Level 3", "Level 4", "Level 5"],
        description: "Enhance governance practices and cybersecurity policy commitment",
    },
    FeatureInfo {
        code: "4.2",
        name: "Password Reuse Policy",
        options: &["Not Allowed", "Allowed"],
        description: "Implement strict password reuse restrictions",
    },
    FeatureInfo {
        code: "4.3",
        name: "Multi-Factor Authentication",
        options: &["Yes", "No"],
        description: "Implement MFA across all project systems and access points",
    },
];

static EXTENDED_FEATURES: &[FeatureInfo] = &[
    extended(
        "5.1",
        "Regulatory Requirements",
        "Ensure comprehensive regulatory compliance for enhanced security posture",
    ),
    extended(
        "5.2",
        "Stakeholder Count",
        "Optimize stakeholder management to improve security communication and buy-in",
    ),
    extended(
        "5.3",
        "Third Party Vendors",
        "Strengthen third-party vendor security requirements and assessments",
    ),
    extended(
        "6.1",
        "Remote Work Level",
        "Implement secure remote work policies and infrastructure",
    ),
    extended(
        "6.2",
        "Cloud Services",
        "Enhance cloud service security configurations and monitoring",
    ),
    extended(
        "6.3",
        "Data Classification",
        "Implement proper data classification and handling procedures",
    ),
    extended(
        "7.1",
        "BMS Integration",
        "Secure building management system integration points",
    ),
    extended(
        "7.2",
        "Access Control",
        "Strengthen access control systems and procedures",
    ),
    extended(
        "7.3",
        "Security Monitoring",
        "Implement comprehensive security monitoring and alerting",
    ),
    extended(
        "8.1",
        "Incident Response",
        "Develop and test incident response procedures",
    ),
    extended(
        "8.2",
        "Backup Strategy",
        "Implement robust backup and recovery strategies",
    ),
    extended(
        "8.3",
        "Security Certifications",
        "Obtain relevant security certifications for the project",
    ),
    extended(
        "9.1",
        "Security Awareness",
        "Enhance security awareness training programs",
    ),
    extended(
        "9.2",
        "Security Team Size",
        "Expand security team to meet project requirements",
    ),
    extended(
        "9.3",
        "Third Party Security Requirements",
        "Enforce third-party security compliance requirements",
    ),
    extended(
        "10.1",
        "Security Budget",
        "Allocate appropriate budget for security initiatives",
    ),
];

const fn extended(
    code: &'static str,
    name: &'static str,
    description: &'static str,
) -> FeatureInfo {
    FeatureInfo {
        code,
        name,
        options: &[],
        description,
    }
}

lazy_static! {
    static ref BY_CODE: HashMap<&'static str, &'static FeatureInfo> = STANDARD_FEATURES
        .iter()
        .chain(EXTENDED_FEATURES.iter())
        .map(|info| (info.code, info))
        .collect();
}

/// Look up catalog metadata for a feature-group code
pub fn lookup(code: &str) -> Option<&'static FeatureInfo> {
    BY_CODE.get(code).copied()
}

/// Human-readable name, or the code itself when it is not catalogued
pub fn feature_name(code: &str) -> String {
    lookup(code)
        .map(|info| info.name.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Label of one level, or the level index when no label is known
pub fn option_label(code: &str, level: usize) -> String {
    lookup(code)
        .and_then(|info| info.options.get(level))
        .map(|label| label.to_string())
        .unwrap_or_else(|| level.to_string())
}

/// Rationale shown next to a recommendation for this group
pub fn feature_description(code: &str) -> String {
    match lookup(code) {
        Some(info) => info.description.to_string(),
        None => format!(
            "Optimize {} configuration for improved security",
            feature_name(code)
        ),
    }
}

/// Find the level whose label equals `label` among the first `levels` levels
pub fn level_for_label(code: &str, label: &str, levels: usize) -> Option<usize> {
    (0..levels).find(|&level| option_label(code, level) == label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_sixteen_unique_groups() {
        assert_eq!(STANDARD_FEATURES.len(), 16);
        let total_levels: usize = STANDARD_FEATURES.iter().map(|f| f.options.len()).sum();
        assert_eq!(total_levels, 72);
        for info in STANDARD_FEATURES {
            assert_eq!(lookup(info.code), Some(info));
        }
    }

    #[test]
    fn labels_for_known_codes() {
        assert_eq!(feature_name("4.3"), "Multi-Factor Authentication");
        assert_eq!(option_label("1.1", 0), "≤3 months");
        assert_eq!(option_label("4.2", 0), "Not Allowed");
        assert_eq!(option_label("4.2", 1), "Allowed");
        assert_eq!(option_label("2.1.3", 5), "N/A");
        assert_eq!(
            feature_description("3.3"),
            "Transition to more secure network infrastructure"
        );
    }

    #[test]
    fn unknown_codes_fall_back() {
        assert_eq!(feature_name("11.4"), "11.4");
        assert_eq!(option_label("11.4", 3), "3");
        assert_eq!(option_label("1.3", 9), "9");
        assert_eq!(
            feature_description("11.4"),
            "Optimize 11.4 configuration for improved security"
        );
        // extended codes have a name but no labels
        assert_eq!(feature_name("10.1"), "Security Budget");
        assert_eq!(option_label("10.1", 1), "1");
    }

    #[test]
    fn label_lookup_round_trips_through_levels() {
        assert_eq!(level_for_label("1.3", "No", 3), Some(1));
        assert_eq!(level_for_label("3.3", "Both", 3), Some(2));
        assert_eq!(level_for_label("3.3", "Both", 2), None);
        assert_eq!(level_for_label("7.7", "2", 4), Some(2));
        assert_eq!(level_for_label("1.3", "Maybe", 3), None);
    }
}
