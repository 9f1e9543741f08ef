/// Parse a posted form body into ordered name/value pairs.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<Vec<(String, String)>, String> {
    let ct = content_type.unwrap_or("application/x-www-form-urlencoded");

    if ct.contains("application/x-www-form-urlencoded") {
        parse_form_urlencoded(body)
    } else if ct.contains("multipart/form-data") {
        Err("multipart bodies are not accepted".to_string())
    } else {
        Err(format!("Unsupported content type: {ct}"))
    }
}

fn parse_form_urlencoded(body: &[u8]) -> Result<Vec<(String, String)>, String> {
    let body_str = std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;
    Ok(form_urlencoded::parse(body_str.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect())
}
