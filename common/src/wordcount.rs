use crate::task::KeyValue;

/// Limpia un token: sólo alfanumérico y '_', en minúscula.
fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase()
}

/// map de WordCount: emite (palabra, "1") por cada palabra del contenido.
pub fn map(_filename: &str, contents: &str) -> Vec<KeyValue> {
    contents
        .split_whitespace()
        .map(normalize)
        .filter(|w| !w.is_empty())
        .map(|w| KeyValue::new(w, "1"))
        .collect()
}

/// reduce de WordCount: cantidad de apariciones de la palabra.
pub fn reduce(_key: &str, values: &[String]) -> String {
    values.len().to_string()
}
