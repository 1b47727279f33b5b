use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Length of every generated password.
pub const GENERATED_LENGTH: usize = 14;

/// Shortest caller-supplied password accepted (after trimming).
pub const MIN_SUPPLIED_LENGTH: usize = 8;

// Ambiguous glyphs (I, O, l, o, 0, 1) are left out so passwords survive being read aloud.
const UPPERCASE: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijkmnpqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%^&*-_=+?";

const CLASSES: [&[u8]; 4] = [UPPERCASE, LOWERCASE, DIGITS, SYMBOLS];

/// Where the password for a direct creation came from
#[derive(Clone, PartialEq, Eq)]
pub enum ResolvedPassword {
    Supplied(String),
    Generated(String),
}

impl ResolvedPassword {
    pub fn as_str(&self) -> &str {
        match self {
            ResolvedPassword::Supplied(p) | ResolvedPassword::Generated(p) => p,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            ResolvedPassword::Supplied(p) | ResolvedPassword::Generated(p) => p,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, ResolvedPassword::Generated(_))
    }
}

impl std::fmt::Debug for ResolvedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedPassword::Supplied(_) => f.write_str("Supplied(<redacted>)"),
            ResolvedPassword::Generated(_) => f.write_str("Generated(<redacted>)"),
        }
    }
}

/// Use the supplied password when it is long enough once trimmed, otherwise generate one.
pub fn resolve_password(supplied: Option<&str>) -> ResolvedPassword {
    match supplied.map(str::trim) {
        Some(p) if p.chars().count() >= MIN_SUPPLIED_LENGTH => ResolvedPassword::Supplied(p.to_string()),
        _ => ResolvedPassword::Generated(generate_password()),
    }
}

/// Generate a password from the operating system's CSPRNG
pub fn generate_password() -> String {
    generate_password_with(&mut OsRng)
}

/// One character from each class, the rest from their union, then shuffled.
pub fn generate_password_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let union: Vec<u8> = CLASSES.iter().flat_map(|class| class.iter().copied()).collect();

    let mut chars: Vec<u8> = Vec::with_capacity(GENERATED_LENGTH);
    for class in CLASSES {
        chars.push(class[rng.gen_range(0..class.len())]);
    }
    while chars.len() < GENERATED_LENGTH {
        chars.push(union[rng.gen_range(0..union.len())]);
    }
    chars.shuffle(rng);

    chars.into_iter().map(char::from).collect()
}
