use std::collections::BTreeMap;

use super::{ContactForm, SelectOption};

/// Parameters copied verbatim into same-named fields.
pub const TEXT_KEYS: [&str; 4] = ["name", "email", "phone", "company"];

/// Parameter matched against the options of the same-named select.
pub const SELECT_KEY: &str = "service";

/// Populate the form from caller-supplied parameters. Returns the number of
/// fields that were set. Never submits and never fails.
pub fn prefill(form: &mut ContactForm, params: &BTreeMap<String, String>) -> usize {
    let mut filled = 0;

    if let Some(wanted) = params.get(SELECT_KEY).filter(|v| !v.is_empty()) {
        if let Some(field) = form.field_mut(SELECT_KEY) {
            if let Some(option) = match_option(&field.options, wanted) {
                field.value = option.value.clone();
                filled += 1;
            }
        }
    }

    for key in TEXT_KEYS {
        let Some(value) = params.get(key).filter(|v| !v.is_empty()) else {
            continue;
        };
        if form.set_value(key, value) {
            filled += 1;
        }
    }

    filled
}

/// Lowercase and turn `-` / `_` separators into spaces.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase().replace(['-', '_'], " ")
}

/// First option whose value or label contains the normalized parameter.
pub fn match_option<'a>(options: &'a [SelectOption], raw: &str) -> Option<&'a SelectOption> {
    let wanted = normalize(raw);
    if wanted.trim().is_empty() {
        return None;
    }

    options.iter().filter(|o| !o.value.is_empty()).find(|o| {
        o.value.to_lowercase().contains(&wanted) || o.label.to_lowercase().contains(&wanted)
    })
}
