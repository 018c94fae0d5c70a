//! Identifier casing and singular forms for generated type names

/// Words Go spells in all caps inside identifiers
const INITIALISMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID",
    "IP", "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP", "TLS",
    "TTL", "UDP", "UI", "UID", "UUID", "URI", "URL", "UTF8", "VM", "XML", "XMPP", "XSRF", "XSS",
];

const UNCOUNTABLE: &[&str] = &[
    "data",
    "equipment",
    "fish",
    "information",
    "money",
    "news",
    "rice",
    "series",
    "sheep",
    "species",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("children", "child"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("men", "man"),
    ("mice", "mouse"),
    ("people", "person"),
    ("teeth", "tooth"),
];

/// Split on separators, lower-to-upper transitions and the end of an
/// upper-case run (`HTTPServer` -> `HTTP`, `Server`).
fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// `user_id` -> `UserId`
pub fn pascal_case(s: &str) -> String {
    split_words(s).iter().map(|w| capitalize(w)).collect()
}

/// Like [`pascal_case`], keeping Go initialisms upper case: `user_id` -> `UserID`
pub fn go_name(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| {
            let upper = w.to_uppercase();
            if INITIALISMS.iter().any(|i| *i == upper) {
                upper
            } else {
                capitalize(w)
            }
        })
        .collect()
}

fn match_case(original: &str, replacement: &str) -> String {
    if original.len() > 1 && original.chars().all(|c| !c.is_lowercase()) {
        replacement.to_uppercase()
    } else if original.starts_with(|c: char| c.is_uppercase()) {
        capitalize(replacement)
    } else {
        replacement.to_string()
    }
}

/// Singular form of the last word of `s`.
///
/// English suffix rules with a short list of irregular and uncountable
/// nouns; anything unrecognised keeps its spelling.
pub fn singularize(s: &str) -> String {
    let lower = s.to_ascii_lowercase();
    if UNCOUNTABLE.iter().any(|w| lower.ends_with(w)) {
        return s.to_string();
    }
    for (plural, singular) in IRREGULAR {
        if lower.ends_with(plural) {
            let (stem, tail) = s.split_at(s.len() - plural.len());
            return format!("{}{}", stem, match_case(tail, singular));
        }
    }

    let strip = |n: usize, suffix: &str| format!("{}{}", &s[..s.len() - n], suffix);

    if lower.ends_with("sses") {
        strip(2, "")
    } else if lower.ends_with("uses") {
        // houses -> house, statuses -> status
        let before = lower[..lower.len() - 4].chars().last();
        if before.map_or(true, |c| "aeiou".contains(c)) {
            strip(1, "")
        } else {
            strip(2, "")
        }
    } else if ["ches", "shes", "xes"].iter().any(|x| lower.ends_with(x)) {
        strip(2, "")
    } else if lower.ends_with("ies") && lower.len() > 4 {
        strip(3, "y")
    } else if ["ss", "us", "is"].iter().any(|x| lower.ends_with(x)) {
        s.to_string()
    } else if lower.ends_with('s') {
        strip(1, "")
    } else {
        s.to_string()
    }
}
