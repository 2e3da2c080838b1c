use rand::Rng;

pub const OPEN_DELIMITER: &str = "$(";
pub const CLOSE_DELIMITER: char = ')';
pub const RANDOM_VARIABLE: &str = "RANDOM";
pub const RANDOM_DIGITS: usize = 10;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub text: String,
    pub missing: Vec<String>,
}

/// Expands every `$(NAME)` in `template` exactly once, left to right.
///
/// Names the lookup cannot resolve expand to nothing and are reported in
/// `missing`, once per occurrence. An opening delimiter without a closing one
/// is copied through verbatim together with everything after it.
pub fn expand<R, F>(template: &str, lookup: F, rng: &mut R) -> Expansion
where
    R: Rng + ?Sized,
    F: Fn(&str) -> Option<String>,
{
    let mut expansion = Expansion {
        text: String::with_capacity(template.len()),
        missing: Vec::new(),
    };
    let mut rest = template;

    while let Some(start) = rest.find(OPEN_DELIMITER) {
        expansion.text.push_str(&rest[..start]);
        let opened = &rest[start..];
        let name_start = OPEN_DELIMITER.len();
        let Some(name_len) = opened[name_start..].find(CLOSE_DELIMITER) else {
            expansion.text.push_str(opened);
            return expansion;
        };
        let name = &opened[name_start..name_start + name_len];

        if name == RANDOM_VARIABLE {
            expansion.text.push_str(&random_digits(rng, RANDOM_DIGITS));
        } else if let Some(value) = lookup(name) {
            expansion.text.push_str(&value);
        } else {
            expansion.missing.push(name.to_string());
        }

        rest = &opened[name_start + name_len + 1..];
    }

    expansion.text.push_str(rest);
    expansion
}

pub fn random_digits<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}
