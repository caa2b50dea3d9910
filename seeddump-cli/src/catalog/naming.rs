//! Entity name resolution for configured selectors
//!
//! Selectors are written by people (`User`, `BlogPost`, `users`), while
//! catalogs expose table names (`users`, `blog_posts`). Resolution tries the
//! exact name first and then progressively looser spellings.

/// Table names the exporter never touches
const SYSTEM_NAMES: &[&str] = &["schema_migrations", "ar_internal_metadata", "_sqlx_migrations"];

/// Whether `name` is store bookkeeping rather than user data
pub fn is_system_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.starts_with("sqlite_") || SYSTEM_NAMES.contains(&lower.as_str())
}

/// Find the catalog name a selector entry refers to
///
/// Order of attempts: exact, case-insensitive, then the plural, singular
/// and bare forms of the snake_case spelling.
pub fn resolve_name<'a>(wanted: &str, known: &[&'a str]) -> Option<&'a str> {
    if let Some(hit) = known.iter().copied().find(|k| *k == wanted) {
        return Some(hit);
    }

    let snake = to_snake_case(wanted);
    let spellings = [
        wanted.to_lowercase(),
        pluralize(&snake),
        singularize(&snake),
        snake,
    ];

    spellings.iter().find_map(|spelling| {
        known
            .iter()
            .copied()
            .find(|k| k.eq_ignore_ascii_case(spelling))
    })
}

/// `BlogPost` -> `blog_post`; already-snake input passes through lowercased
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

/// Convert a name to plural form using English grammar rules
pub fn pluralize(name: &str) -> String {
    if name.is_empty() {
        return name.to_string();
    }

    let lower = name.to_lowercase();

    if lower.ends_with('s') || lower.ends_with("sh") || lower.ends_with("ch") || lower.ends_with('x') {
        return format!("{}es", name);
    }

    // Words ending in 'z' -> double it and add 'es'
    if lower.ends_with('z') && !lower.ends_with("tz") {
        return format!("{}zes", name);
    }

    // Consonant + 'y' -> 'ies'
    if let Some(stem) = lower.strip_suffix('y') {
        if stem.chars().last().is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{}ies", &name[..name.len() - 1]);
        }
    }

    if lower.ends_with("fe") {
        return format!("{}ves", &name[..name.len() - 2]);
    }
    if lower.ends_with('f') {
        return format!("{}ves", &name[..name.len() - 1]);
    }

    if let Some(stem) = lower.strip_suffix('o') {
        if stem.chars().last().is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{}es", name);
        }
    }

    format!("{}s", name)
}

/// Best-effort inverse of [`pluralize`]
pub fn singularize(name: &str) -> String {
    let lower = name.to_lowercase();

    if lower.ends_with("ies") && lower.len() > 3 {
        return format!("{}y", &name[..name.len() - 3]);
    }
    if lower.ends_with("ves") && lower.len() > 3 {
        return format!("{}f", &name[..name.len() - 3]);
    }
    if lower.ends_with("zzes") {
        return name[..name.len() - 3].to_string();
    }
    for suffix in ["sses", "shes", "ches", "xes", "oes"] {
        if lower.ends_with(suffix) {
            return name[..name.len() - 2].to_string();
        }
    }
    if lower.ends_with('s') && !lower.ends_with("ss") {
        return name[..name.len() - 1].to_string();
    }
    name.to_string()
}
