//! Case-transform collaborator: `(string, format) -> string`.

use heck::{
    ToKebabCase, ToLowerCamelCase, ToPascalCase, ToSnakeCase, ToTitleCase, ToTrainCase,
};
use lazy_static::lazy_static;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFormat {
    Lower,
    Upper,
    Title,
    Pascal,
    Snake,
    Camel,
    Kebab,
    Flat,
    Train,
    Slug,
    Reverse,
}

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new(r"[^A-Za-z0-9]+").unwrap();
}

pub fn transform_case(value: &str, format: CaseFormat) -> String {
    match format {
        CaseFormat::Lower => value.to_lowercase(),
        CaseFormat::Upper => value.to_uppercase(),
        CaseFormat::Title => value.to_title_case(),
        CaseFormat::Pascal => value.to_pascal_case(),
        CaseFormat::Snake => value.to_snake_case(),
        CaseFormat::Camel => value.to_lower_camel_case(),
        CaseFormat::Kebab => value.to_kebab_case(),
        CaseFormat::Flat => NON_ALNUM.replace_all(value, "").to_lowercase(),
        CaseFormat::Train => value.to_train_case(),
        CaseFormat::Slug => slug::slugify(value),
        CaseFormat::Reverse => value.chars().rev().collect(),
    }
}
