//! Providers backed by the `fake` data sets.

use fake::Fake;
use fake::faker::address::en::{
    BuildingNumber, CityName, CountryCode, CountryName, PostCode, StateAbbr, StateName,
    StreetName, ZipCode,
};
use fake::faker::company::en::{CatchPhrase, CompanyName, Industry};
use fake::faker::creditcard::en::CreditCardNumber;
use fake::faker::currency::en::CurrencyCode;
use fake::faker::filesystem::en::{FileExtension, FileName, MimeType};
use fake::faker::internet::en::{
    DomainSuffix, FreeEmail, IPv4, IPv6, MACAddress, Password, SafeEmail, UserAgent, Username,
};
use fake::faker::job::en::Title as JobTitle;
use fake::faker::lorem::en::Word;
use fake::faker::name::en::{FirstName, LastName, Name, Suffix, Title};
use fake::faker::phone_number::en::PhoneNumber;
use rand::{Rng, RngCore};
use serde_json::{Map, Value};

use crate::errors::GenerationError;
use crate::generators::{Generator, GeneratorRegistry};
use crate::params::{ParamKind, ParamSpec, validate_params};
use crate::value::GeneratedValue;

type Draw = fn(&mut dyn RngCore) -> GeneratedValue;

macro_rules! text {
    ($faker:expr) => {
        |rng: &mut dyn RngCore| {
            let value: String = $faker.fake_with_rng(rng);
            GeneratedValue::Text(value)
        }
    };
}

struct FakerEntry {
    id: &'static str,
    module: &'static str,
    doc: &'static str,
    draw: Draw,
}

const ENTRIES: &[FakerEntry] = &[
    FakerEntry {
        id: "name",
        module: "person",
        doc: "Full person name.",
        draw: text!(Name()),
    },
    FakerEntry {
        id: "first_name",
        module: "person",
        doc: "Given name.",
        draw: text!(FirstName()),
    },
    FakerEntry {
        id: "last_name",
        module: "person",
        doc: "Family name.",
        draw: text!(LastName()),
    },
    FakerEntry {
        id: "prefix",
        module: "person",
        doc: "Name prefix such as `Mrs.`.",
        draw: text!(Title()),
    },
    FakerEntry {
        id: "suffix",
        module: "person",
        doc: "Name suffix such as `Jr.`.",
        draw: text!(Suffix()),
    },
    FakerEntry {
        id: "email",
        module: "internet",
        doc: "Email address.",
        draw: text!(FreeEmail()),
    },
    FakerEntry {
        id: "safe_email",
        module: "internet",
        doc: "Email address on a reserved example domain.",
        draw: text!(SafeEmail()),
    },
    FakerEntry {
        id: "free_email",
        module: "internet",
        doc: "Email address on a free mail provider.",
        draw: text!(FreeEmail()),
    },
    FakerEntry {
        id: "user_name",
        module: "internet",
        doc: "Login name.",
        draw: text!(Username()),
    },
    FakerEntry {
        id: "ipv4",
        module: "internet",
        doc: "IPv4 address.",
        draw: text!(IPv4()),
    },
    FakerEntry {
        id: "ipv6",
        module: "internet",
        doc: "IPv6 address.",
        draw: text!(IPv6()),
    },
    FakerEntry {
        id: "mac_address",
        module: "internet",
        doc: "MAC address.",
        draw: text!(MACAddress()),
    },
    FakerEntry {
        id: "user_agent",
        module: "internet",
        doc: "Browser user agent string.",
        draw: text!(UserAgent()),
    },
    FakerEntry {
        id: "domain_name",
        module: "internet",
        doc: "Domain name.",
        draw: domain_name,
    },
    FakerEntry {
        id: "url",
        module: "internet",
        doc: "HTTP(S) URL.",
        draw: url,
    },
    FakerEntry {
        id: "phone_number",
        module: "phone_number",
        doc: "Phone number.",
        draw: text!(PhoneNumber()),
    },
    FakerEntry {
        id: "address",
        module: "address",
        doc: "Street address with city, state and zip code.",
        draw: address,
    },
    FakerEntry {
        id: "street_name",
        module: "address",
        doc: "Street name.",
        draw: text!(StreetName()),
    },
    FakerEntry {
        id: "city",
        module: "address",
        doc: "City name.",
        draw: text!(CityName()),
    },
    FakerEntry {
        id: "state",
        module: "address",
        doc: "State name.",
        draw: text!(StateName()),
    },
    FakerEntry {
        id: "state_abbr",
        module: "address",
        doc: "Two-letter state abbreviation.",
        draw: text!(StateAbbr()),
    },
    FakerEntry {
        id: "country",
        module: "address",
        doc: "Country name.",
        draw: text!(CountryName()),
    },
    FakerEntry {
        id: "country_code",
        module: "address",
        doc: "ISO country code.",
        draw: text!(CountryCode()),
    },
    FakerEntry {
        id: "zipcode",
        module: "address",
        doc: "Zip code.",
        draw: text!(ZipCode()),
    },
    FakerEntry {
        id: "postcode",
        module: "address",
        doc: "Postal code.",
        draw: text!(PostCode()),
    },
    FakerEntry {
        id: "building_number",
        module: "address",
        doc: "Building number.",
        draw: text!(BuildingNumber()),
    },
    FakerEntry {
        id: "latitude",
        module: "address",
        doc: "Latitude in degrees.",
        draw: |rng: &mut dyn RngCore| GeneratedValue::Float(coordinate(rng, 90.0)),
    },
    FakerEntry {
        id: "longitude",
        module: "address",
        doc: "Longitude in degrees.",
        draw: |rng: &mut dyn RngCore| GeneratedValue::Float(coordinate(rng, 180.0)),
    },
    FakerEntry {
        id: "company",
        module: "company",
        doc: "Company name.",
        draw: text!(CompanyName()),
    },
    FakerEntry {
        id: "catch_phrase",
        module: "company",
        doc: "Marketing catch phrase.",
        draw: text!(CatchPhrase()),
    },
    FakerEntry {
        id: "industry",
        module: "company",
        doc: "Industry name.",
        draw: text!(Industry()),
    },
    FakerEntry {
        id: "job",
        module: "job",
        doc: "Job title.",
        draw: text!(JobTitle()),
    },
    FakerEntry {
        id: "credit_card_number",
        module: "credit_card",
        doc: "Credit card number.",
        draw: text!(CreditCardNumber()),
    },
    FakerEntry {
        id: "currency_code",
        module: "currency",
        doc: "ISO 4217 currency code.",
        draw: text!(CurrencyCode()),
    },
    FakerEntry {
        id: "file_name",
        module: "file",
        doc: "File name with extension.",
        draw: text!(FileName()),
    },
    FakerEntry {
        id: "file_extension",
        module: "file",
        doc: "File extension.",
        draw: text!(FileExtension()),
    },
    FakerEntry {
        id: "mime_type",
        module: "file",
        doc: "MIME type.",
        draw: text!(MimeType()),
    },
];

const PASSWORD_PARAMS: &[ParamSpec] = &[ParamSpec::new("length", ParamKind::Int, "10")];
const DEFAULT_PASSWORD_LENGTH: usize = 10;

pub fn register(registry: &mut GeneratorRegistry) {
    for entry in ENTRIES {
        registry.register_generator(Box::new(FakerGenerator { entry }));
    }
    registry.register_generator(Box::new(PasswordGenerator));
}

struct FakerGenerator {
    entry: &'static FakerEntry,
}

impl Generator for FakerGenerator {
    fn id(&self) -> &'static str {
        self.entry.id
    }

    fn module(&self) -> &'static str {
        self.entry.module
    }

    fn doc(&self) -> &'static str {
        self.entry.doc
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        validate_params(args, &[], self.entry.id)?;
        Ok((self.entry.draw)(rng))
    }
}

struct PasswordGenerator;

impl Generator for PasswordGenerator {
    fn id(&self) -> &'static str {
        "password"
    }

    fn module(&self) -> &'static str {
        "internet"
    }

    fn doc(&self) -> &'static str {
        "Random password of `length` characters."
    }

    fn params(&self) -> &'static [ParamSpec] {
        PASSWORD_PARAMS
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let params = validate_params(args, PASSWORD_PARAMS, "password")?;
        let length = match params.get_i64("length") {
            None => DEFAULT_PASSWORD_LENGTH,
            Some(length) if length > 0 => length as usize,
            Some(_) => {
                return Err(GenerationError::InvalidArgument(
                    "password(): length must be > 0".to_string(),
                ));
            }
        };
        let value: String = Password(length..length + 1).fake_with_rng(rng);
        Ok(GeneratedValue::Text(value))
    }
}

fn domain_name(rng: &mut dyn RngCore) -> GeneratedValue {
    let word: String = Word().fake_with_rng(rng);
    let suffix: String = DomainSuffix().fake_with_rng(rng);
    GeneratedValue::Text(format!("{}.{suffix}", word.to_lowercase()))
}

fn url(rng: &mut dyn RngCore) -> GeneratedValue {
    let scheme = if rng.random_bool(0.5) { "https" } else { "http" };
    let GeneratedValue::Text(domain) = domain_name(rng) else {
        return GeneratedValue::Null;
    };
    GeneratedValue::Text(format!("{scheme}://www.{domain}/"))
}

fn address(rng: &mut dyn RngCore) -> GeneratedValue {
    let number: String = BuildingNumber().fake_with_rng(rng);
    let street: String = StreetName().fake_with_rng(rng);
    let city: String = CityName().fake_with_rng(rng);
    let state: String = StateAbbr().fake_with_rng(rng);
    let zip: String = ZipCode().fake_with_rng(rng);
    GeneratedValue::Text(format!("{number} {street}\n{city}, {state} {zip}"))
}

fn coordinate(rng: &mut dyn RngCore, limit: f64) -> f64 {
    let value: f64 = rng.random_range(-limit..=limit);
    (value * 1_000_000.0).round() / 1_000_000.0
}
