/// Check if the honeypot field was filled in. Returns true if spam detected.
pub fn is_spam<'a, I>(pairs: I, honeypot_field: Option<&str>) -> bool
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let Some(field) = honeypot_field else {
        return false;
    };

    if field.is_empty() {
        return false;
    }

    pairs
        .into_iter()
        .any(|(name, value)| name == field && !value.trim().is_empty())
}
