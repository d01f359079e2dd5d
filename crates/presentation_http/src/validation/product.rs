//! Product request bodies
//!
//! Bodies are deserialized into [`ProductPayload`], where every field is
//! tri-state: absent, explicit `null`, or a value. Bounds are checked by the
//! [`IntoValidated`] impls, which report every violated field at once.

use std::borrow::Cow;

use domain::{DomainError, NewProduct, Price, ProductChanges, ProductStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Number;
use utoipa::ToSchema;
use validator::{ValidateUrl, ValidationError, ValidationErrors};

use super::IntoValidated;

pub const NAME_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 2000;
pub const CATEGORY_MAX_CHARS: usize = 100;

/// Maps a present field to `Some`, so `null` becomes `Some(None)` and an
/// absent field keeps the `None` default.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Raw product fields as sent by the client
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    /// Display name, trimmed, 1 to 200 characters
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>, max_length = 200, example = "Ceramic Vase")]
    pub name: Option<Option<String>>,

    /// Up to 2000 characters; `null` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>, nullable, max_length = 2000)]
    pub description: Option<Option<String>>,

    /// Greater than 0, at most 9999999.99
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<f64>, example = 49.99)]
    pub price: Option<Option<Number>>,

    /// Same bounds as `price`; `null` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<f64>, nullable)]
    pub cost_price: Option<Option<Number>>,

    /// Up to 100 characters; `null` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>, nullable, max_length = 100, example = "Home")]
    pub category: Option<Option<String>>,

    /// Whole number, not negative
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<i64>, minimum = 0)]
    pub stock: Option<Option<Number>>,

    /// `draft` or `active`
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>, example = "draft")]
    pub status: Option<Option<String>>,

    /// Absolute image URLs in display order
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<Vec<String>>)]
    pub images: Option<Option<Vec<String>>>,
}

/// Body of `POST /products`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CreateProductRequest(pub ProductPayload);

/// Body of `PUT`/`PATCH /products/{id}`; every field optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UpdateProductRequest(pub ProductPayload);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Create,
    Update,
}

#[derive(Debug)]
struct FieldCollector {
    errors: ValidationErrors,
}

impl FieldCollector {
    fn new() -> Self {
        Self {
            errors: ValidationErrors::new(),
        }
    }

    fn add(
        &mut self,
        field: &'static str,
        code: &'static str,
        message: impl Into<Cow<'static, str>>,
    ) {
        let mut error = ValidationError::new(code);
        error.message = Some(message.into());
        self.errors.add(field, error);
    }

    /// Unwrap a non-nullable field, recording `Required` or a null error
    fn non_null<'a, T>(
        &mut self,
        field: &'static str,
        value: &'a Option<Option<T>>,
        expected: &str,
        required: bool,
    ) -> Option<&'a T> {
        match value {
            None => {
                if required {
                    self.add(field, "required", "Required");
                }
                None
            },
            Some(None) => {
                self.add(
                    field,
                    "invalid_type",
                    format!("Expected {expected}, received null"),
                );
                None
            },
            Some(Some(v)) => Some(v),
        }
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn check_name(c: &mut FieldCollector, name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        c.add("name", "length", "Product name is required");
        return None;
    }
    if char_len(trimmed) > NAME_MAX_CHARS {
        c.add(
            "name",
            "length",
            "Product name must be less than 200 characters",
        );
        return None;
    }
    Some(trimmed.to_string())
}

fn check_text(
    c: &mut FieldCollector,
    field: &'static str,
    value: &str,
    max: usize,
    message: &'static str,
) -> Option<String> {
    if char_len(value) > max {
        c.add(field, "length", message);
        return None;
    }
    Some(value.to_string())
}

/// Exact decimal for a JSON number; `None` when it does not fit a `Decimal`
fn decimal_of(n: &Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    let repr = n.to_string();
    repr.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&repr))
        .ok()
}

fn check_price(
    c: &mut FieldCollector,
    field: &'static str,
    n: &Number,
    not_positive: &'static str,
    too_high: &'static str,
) -> Option<Price> {
    let result = match decimal_of(n) {
        Some(amount) => Price::new(amount),
        None if n.as_f64().is_some_and(|f| f < 0.0) => {
            Err(DomainError::PriceNotPositive(n.to_string()))
        },
        None => Err(DomainError::PriceTooHigh(n.to_string())),
    };
    match result {
        Ok(price) => Some(price),
        Err(DomainError::PriceNotPositive(_)) => {
            c.add(field, "range", not_positive);
            None
        },
        Err(_) => {
            c.add(field, "range", too_high);
            None
        },
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn check_stock(c: &mut FieldCollector, n: &Number) -> Option<u32> {
    if let Some(v) = n.as_u64() {
        if let Ok(stock) = u32::try_from(v) {
            return Some(stock);
        }
        c.add("stock", "range", "Stock is too high");
        return None;
    }
    if n.as_i64().is_some() {
        c.add("stock", "range", "Stock cannot be negative");
        return None;
    }

    let f = n.as_f64().unwrap_or(f64::NAN);
    let mut valid = true;
    if f.fract() != 0.0 {
        c.add("stock", "integer", "Stock must be a whole number");
        valid = false;
    }
    if f < 0.0 {
        c.add("stock", "range", "Stock cannot be negative");
        valid = false;
    }
    if valid && f > f64::from(u32::MAX) {
        c.add("stock", "range", "Stock is too high");
        valid = false;
    }
    valid.then_some(f as u32)
}

fn check_status(c: &mut FieldCollector, status: &str) -> Option<ProductStatus> {
    if let Ok(parsed) = status.parse::<ProductStatus>() {
        return Some(parsed);
    }
    c.add(
        "status",
        "enum",
        format!("Invalid enum value. Expected 'draft' | 'active', received '{status}'"),
    );
    None
}

fn check_images(c: &mut FieldCollector, images: &[String]) -> Option<Vec<String>> {
    let mut valid = true;
    for image in images {
        if !image.validate_url() {
            c.add("images", "url", "Invalid image URL");
            valid = false;
        }
    }
    valid.then(|| images.to_vec())
}

impl ProductPayload {
    /// Check every field and collect the touched ones as a change set
    fn parse(&self, mode: Mode) -> Result<ProductChanges, ValidationErrors> {
        let required = mode == Mode::Create;
        let mut c = FieldCollector::new();
        let mut changes = ProductChanges::default();

        if let Some(name) = c.non_null("name", &self.name, "string", required) {
            changes.name = check_name(&mut c, name);
        }

        changes.description = match &self.description {
            None => None,
            Some(None) => Some(None),
            Some(Some(text)) => check_text(
                &mut c,
                "description",
                text,
                DESCRIPTION_MAX_CHARS,
                "Description must be less than 2000 characters",
            )
            .map(Some),
        };

        if let Some(price) = c.non_null("price", &self.price, "number", required) {
            changes.price = check_price(
                &mut c,
                "price",
                price,
                "Price must be greater than 0",
                "Price is too high",
            );
        }

        changes.cost_price = match &self.cost_price {
            None => None,
            Some(None) => Some(None),
            Some(Some(n)) => check_price(
                &mut c,
                "costPrice",
                n,
                "Cost price must be greater than 0",
                "Cost price is too high",
            )
            .map(Some),
        };

        changes.category = match &self.category {
            None => None,
            Some(None) => Some(None),
            Some(Some(text)) => check_text(
                &mut c,
                "category",
                text,
                CATEGORY_MAX_CHARS,
                "Category must be less than 100 characters",
            )
            .map(Some),
        };

        if let Some(stock) = c.non_null("stock", &self.stock, "number", false) {
            changes.stock = check_stock(&mut c, stock);
        }

        if let Some(status) = c.non_null("status", &self.status, "'draft' | 'active'", false) {
            changes.status = check_status(&mut c, status);
        }

        if let Some(images) = c.non_null("images", &self.images, "array", false) {
            changes.images = check_images(&mut c, images);
        }

        c.finish(changes)
    }
}

impl CreateProductRequest {
    /// Validated creation input with defaults for omitted fields
    pub fn into_new_product(self) -> Result<NewProduct, ValidationErrors> {
        let changes = self.0.parse(Mode::Create)?;
        let (Some(name), Some(price)) = (changes.name, changes.price) else {
            let mut c = FieldCollector::new();
            c.add("name", "required", "Required");
            return Err(c.errors);
        };

        Ok(NewProduct {
            name,
            description: changes.description.flatten(),
            price,
            cost_price: changes.cost_price.flatten(),
            category: changes.category.flatten(),
            stock: changes.stock.unwrap_or(0),
            status: changes.status.unwrap_or_default(),
            images: changes.images.unwrap_or_default(),
        })
    }
}

impl IntoValidated for CreateProductRequest {
    type Output = NewProduct;

    fn into_validated(self) -> Result<NewProduct, ValidationErrors> {
        self.into_new_product()
    }
}

impl UpdateProductRequest {
    /// Validated change set; omitted fields stay untouched
    pub fn into_changes(self) -> Result<ProductChanges, ValidationErrors> {
        self.0.parse(Mode::Update)
    }
}

impl IntoValidated for UpdateProductRequest {
    type Output = ProductChanges;

    fn into_validated(self) -> Result<ProductChanges, ValidationErrors> {
        self.into_changes()
    }
}
