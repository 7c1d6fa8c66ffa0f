//! Random but plausible user data for write requests.

use rand::Rng;
use rand::seq::IndexedRandom;

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Diego", "Elena", "Felipe", "Gabriela", "Hugo", "Irene", "Julian",
    "Karen", "Lucas", "Marta", "Nicolas", "Olivia", "Pablo",
];

const LAST_NAMES: &[&str] = &[
    "Alvarez", "Benitez", "Castro", "Dominguez", "Espinoza", "Fernandez", "Garcia", "Herrera",
    "Ibarra", "Juarez", "Lopez", "Morales", "Navarro", "Ortega",
];

const DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "mail.test"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl NewUser {
    pub fn form(&self) -> [(&str, &str); 3] {
        [
            ("name", self.name.as_str()),
            ("email", self.email.as_str()),
            ("phone", self.phone.as_str()),
        ]
    }
}

pub fn user() -> NewUser {
    let mut rng = rand::rng();
    let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Ana");
    let last = LAST_NAMES.choose(&mut rng).copied().unwrap_or("Lopez");
    let domain = DOMAINS.choose(&mut rng).copied().unwrap_or("example.com");
    let tag: u16 = rng.random_range(1..1000);

    NewUser {
        name: format!("{first} {last}"),
        email: format!(
            "{}.{}{tag}@{domain}",
            first.to_ascii_lowercase(),
            last.to_ascii_lowercase()
        ),
        phone: phone_number(),
    }
}

/// Phone number shaped like `555-123-4567 x89`.
pub fn phone_number() -> String {
    let mut rng = rand::rng();
    let mut number = format!(
        "{:03}-{:03}-{:04}",
        rng.random_range(200..1000),
        rng.random_range(0..1000),
        rng.random_range(0..10_000)
    );
    if rng.random_bool(0.3) {
        number.push_str(&format!(" x{}", rng.random_range(1..1000)));
    }
    number
}
