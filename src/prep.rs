//! Prep checklists: "what to bring" suggestions keyed off a task's purpose
//! and explicit rule tags, plus whatever items the user already listed.
//!
//! This is a small collaborator port, not a tiered pipeline: one static
//! keyword table, looked up by substring match against free text.

use std::collections::BTreeSet;

/// Purpose/rule-tag keyword to checklist items, keyed the way the
/// underlying rule table is keyed (lowercase keyword -> item list).
pub trait PrepPort: Send + Sync {
    /// Items explicitly required, plus rule-based suggestions matched
    /// against `purpose` (substring) and `auto_rules` (exact comma-separated
    /// tags), plus the always-on defaults.
    fn checklist_for(&self, purpose: Option<&str>, auto_rules: Option<&str>, explicit_items: &[String]) -> Vec<String>;
}

/// Keyword -> suggested items. Default essentials apply unconditionally.
const PACKING_RULES: &[(&str, &[&str])] = &[
    ("dmv", &["Driver's license/ID", "Proof of address", "Payment method", "Appointment confirmation"]),
    ("license", &["Driver's license/ID", "Proof of address", "Payment method", "Appointment confirmation"]),
    ("registration", &["Driver's license/ID", "Vehicle registration", "Insurance card", "Payment method"]),
    ("bank", &["ID", "Documents to sign", "Payment method", "Account information"]),
    ("notary", &["ID", "Documents to sign", "Payment method"]),
    ("tax", &["ID", "Tax documents", "W-2/1099 forms", "Payment method"]),
    ("car service", &["Car keys", "Insurance card", "Service appointment details"]),
    ("service center", &["Car keys", "Insurance card", "Service appointment details"]),
    ("mechanic", &["Car keys", "Insurance card", "Service appointment details"]),
    ("oil change", &["Car keys", "Service coupon"]),
    ("inspection", &["Car keys", "Insurance card", "Vehicle registration"]),
    ("doctor", &["ID", "Insurance card", "List of medications", "Appointment confirmation"]),
    ("hospital", &["ID", "Insurance card", "List of medications", "Emergency contact info"]),
    ("pharmacy", &["ID", "Insurance card", "Prescription"]),
    ("dentist", &["ID", "Insurance card", "Appointment confirmation"]),
    ("school", &["Forms", "ID", "Payment method"]),
    ("university", &["Student ID", "Forms", "Laptop"]),
    ("passport", &["Current passport", "ID", "Passport photos", "Payment method", "Supporting documents"]),
    ("court", &["ID", "Court summons", "Documents"]),
    ("post office", &["ID", "Package/mail", "Tracking number"]),
    ("grocery", &["Reusable bags", "Shopping list"]),
    ("returns", &["Receipt", "Item to return", "ID"]),
];

const DEFAULT_ITEMS: &[&str] = &["Phone", "Wallet"];

fn rule_items(keyword: &str) -> Option<&'static [&'static str]> {
    PACKING_RULES.iter().find(|(k, _)| *k == keyword).map(|(_, items)| *items)
}

/// Which rule keywords match a purpose string (substring, case-insensitive).
pub fn matching_rules(purpose: &str) -> Vec<&'static str> {
    let purpose_lower = purpose.to_lowercase();
    PACKING_RULES
        .iter()
        .filter(|(keyword, _)| purpose_lower.contains(keyword))
        .map(|(keyword, _)| *keyword)
        .collect()
}

/// Suggested items from `purpose` (substring match) and `auto_rules`
/// (exact, comma-separated tags), plus the default essentials.
pub fn suggested_items(purpose: Option<&str>, auto_rules: Option<&str>) -> Vec<String> {
    let mut suggestions: BTreeSet<String> = BTreeSet::new();

    if let Some(purpose) = purpose {
        for keyword in matching_rules(purpose) {
            if let Some(items) = rule_items(keyword) {
                suggestions.extend(items.iter().map(|s| s.to_string()));
            }
        }
    }

    if let Some(auto_rules) = auto_rules {
        for tag in auto_rules.split(',').map(|t| t.trim().to_lowercase()) {
            if let Some(items) = rule_items(&tag) {
                suggestions.extend(items.iter().map(|s| s.to_string()));
            }
        }
    }

    suggestions.extend(DEFAULT_ITEMS.iter().map(|s| s.to_string()));
    suggestions.into_iter().collect()
}

/// Static-table `PrepPort`: the only implementation this crate ships.
pub struct KeywordPackingRules;

impl PrepPort for KeywordPackingRules {
    fn checklist_for(&self, purpose: Option<&str>, auto_rules: Option<&str>, explicit_items: &[String]) -> Vec<String> {
        let mut items: BTreeSet<String> = explicit_items.iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        items.extend(suggested_items(purpose, auto_rules));
        items.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dmv_purpose_suggests_license_and_defaults() {
        let port = KeywordPackingRules;
        let checklist = port.checklist_for(Some("Renew driver's license at the DMV"), None, &[]);
        assert!(checklist.contains(&"Driver's license/ID".to_string()));
        assert!(checklist.contains(&"Phone".to_string()));
        assert!(checklist.contains(&"Wallet".to_string()));
    }

    #[test]
    fn auto_rules_tag_matches_exactly() {
        let port = KeywordPackingRules;
        let checklist = port.checklist_for(None, Some("bank, notary"), &[]);
        assert!(checklist.contains(&"Documents to sign".to_string()));
        assert!(checklist.contains(&"Account information".to_string()));
    }

    #[test]
    fn explicit_items_are_preserved_and_deduplicated() {
        let port = KeywordPackingRules;
        let checklist = port.checklist_for(None, None, &["Phone".to_string(), "Umbrella".to_string()]);
        assert_eq!(checklist.iter().filter(|i| *i == "Phone").count(), 1);
        assert!(checklist.contains(&"Umbrella".to_string()));
    }

    #[test]
    fn no_purpose_or_rules_yields_only_defaults() {
        let checklist = suggested_items(None, None);
        assert_eq!(checklist, vec!["Phone".to_string(), "Wallet".to_string()]);
    }

    #[test]
    fn matching_rules_finds_every_keyword_hit() {
        let matches = matching_rules("Oil change and inspection at the service center");
        assert!(matches.contains(&"oil change"));
        assert!(matches.contains(&"inspection"));
        assert!(matches.contains(&"service center"));
    }
}
