//! Client-side validation for the add/edit forms.
//!
//! Forms are entered as `key=value` arguments; keys are matched loosely
//! (`first_name`, `firstName` and `first-name` are the same field). A form
//! that fails validation never reaches the network.

use crate::error::FormError;
use crate::models::{NewProduct, NewUser, ProductStatus, UserPatch, UserStatus};
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;

pub const MAX_IMAGES: usize = 8;
pub const MAX_IMAGE_BYTES: u64 = 500 * 1024;
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
];

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Parsed `key=value` arguments. Repeated keys accumulate.
#[derive(Debug, Default)]
pub struct Fields {
    values: BTreeMap<String, Vec<String>>,
}

fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

impl Fields {
    pub fn parse(args: &[String]) -> Result<Self, FormError> {
        let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for arg in args {
            let Some((key, value)) = arg.split_once('=') else {
                return Err(FormError::Invalid {
                    field: "arguments",
                    reason: format!("expected key=value, got '{}'", arg),
                });
            };
            values
                .entry(fold_key(key))
                .or_default()
                .push(value.trim().to_string());
        }
        Ok(Self { values })
    }

    /// Last value given for any of `keys`, if non-empty.
    fn get(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| self.values.get(*k))
            .filter_map(|v| v.last())
            .find(|v| !v.is_empty())
            .cloned()
    }

    /// Every value for any of `keys`; comma-separated values are split.
    fn all(&self, keys: &[&str]) -> Vec<String> {
        keys.iter()
            .filter_map(|k| self.values.get(*k))
            .flatten()
            .flat_map(|v| v.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

impl ProductForm {
    pub fn from_fields(fields: &Fields) -> Self {
        Self {
            name: fields.get(&["name"]),
            price: fields.get(&["price"]),
            description: fields.get(&["description", "desc"]),
            images: fields.all(&["images", "image"]),
            category: fields.get(&["category"]),
            status: fields.get(&["status"]),
        }
    }

    /// Check every field; all problems are reported, not just the first.
    pub fn validate(&self) -> Result<NewProduct, Vec<FormError>> {
        let mut errors = Vec::new();

        let name = required_min(&self.name, "name", 2, &mut errors);
        let description = required_min(&self.description, "description", 10, &mut errors);

        let price = match self.price.as_deref() {
            None => {
                errors.push(FormError::Required { field: "price" });
                0.0
            }
            Some(raw) => match raw.replace(',', "").parse::<f64>() {
                Ok(p) if p.is_finite() && p >= 0.0 => p,
                Ok(_) => {
                    errors.push(FormError::Invalid {
                        field: "price",
                        reason: "must be 0 or more".to_string(),
                    });
                    0.0
                }
                Err(_) => {
                    errors.push(FormError::Invalid {
                        field: "price",
                        reason: format!("'{}' is not a number", raw),
                    });
                    0.0
                }
            },
        };

        let status = match self.status.as_deref().map(ProductStatus::parse) {
            None => ProductStatus::Active,
            Some(s @ (ProductStatus::Active | ProductStatus::Inactive)) => s,
            Some(ProductStatus::Other(raw)) => {
                errors.push(FormError::Invalid {
                    field: "status",
                    reason: format!("'{}' is not Active or Inactive", raw),
                });
                ProductStatus::Active
            }
        };

        let mut images = Vec::new();
        if self.images.is_empty() {
            errors.push(FormError::Required { field: "images" });
        } else if self.images.len() > MAX_IMAGES {
            errors.push(FormError::Invalid {
                field: "images",
                reason: format!("at most {} images, got {}", MAX_IMAGES, self.images.len()),
            });
        } else {
            for src in &self.images {
                match resolve_image(src) {
                    Ok(image) => images.push(image),
                    Err(e) => errors.push(e),
                }
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(NewProduct {
            name,
            price,
            description,
            images,
            status,
            category: self.category.clone(),
        })
    }
}

fn required_min(
    value: &Option<String>,
    field: &'static str,
    min: usize,
    errors: &mut Vec<FormError>,
) -> String {
    match value {
        None => {
            errors.push(FormError::Required { field });
            String::new()
        }
        Some(v) if v.chars().count() < min => {
            errors.push(FormError::TooShort { field, min });
            v.clone()
        }
        Some(v) => v.clone(),
    }
}

fn image_mime(path: &str) -> Option<&'static str> {
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// Remote URLs and data URLs pass through; local files are type- and
/// size-checked, then inlined as a data URL.
pub fn resolve_image(src: &str) -> Result<String, FormError> {
    if src.starts_with("http://") || src.starts_with("https://") || src.starts_with("data:image/") {
        return Ok(src.to_string());
    }

    let unsupported = || FormError::Unsupported {
        field: "images",
        reason: format!("{}: please use a JPG, JPEG, PNG or WebP image", src),
    };
    let mime = image_mime(src).ok_or_else(unsupported)?;

    let meta = std::fs::metadata(src).map_err(|e| FormError::Invalid {
        field: "images",
        reason: format!("{}: {}", src, e),
    })?;
    if meta.len() > MAX_IMAGE_BYTES {
        return Err(FormError::Unsupported {
            field: "images",
            reason: format!("{}: image must be smaller than 500KB", src),
        });
    }

    let bytes = std::fs::read(src).map_err(|e| FormError::Invalid {
        field: "images",
        reason: format!("{}: {}", src, e),
    })?;
    Ok(format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    ))
}

pub fn is_email(s: &str) -> bool {
    EMAIL.is_match(s)
}

#[derive(Debug, Default)]
pub struct UserForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

impl UserForm {
    pub fn from_fields(fields: &Fields) -> Self {
        Self {
            first_name: fields.get(&["firstname", "first"]),
            last_name: fields.get(&["lastname", "last"]),
            email: fields.get(&["email"]),
            phone: fields.get(&["phone"]),
            password: fields.get(&["password"]),
        }
    }

    pub fn validate(&self) -> Result<NewUser, Vec<FormError>> {
        let mut errors = Vec::new();
        let first_name = required_min(&self.first_name, "first name", 1, &mut errors);
        let last_name = required_min(&self.last_name, "last name", 1, &mut errors);
        let email = required_min(&self.email, "email", 1, &mut errors);
        if !email.is_empty() && !is_email(&email) {
            errors.push(FormError::Invalid {
                field: "email",
                reason: format!("'{}' is not an email address", email),
            });
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(NewUser {
            first_name,
            last_name,
            email,
            phone: self.phone.clone(),
            password: self.password.clone(),
        })
    }
}

/// Build an update from the fields given; unknown values are rejected.
pub fn user_patch(fields: &Fields) -> Result<UserPatch, Vec<FormError>> {
    let mut errors = Vec::new();
    let patch = UserPatch {
        first_name: fields.get(&["firstname", "first"]),
        last_name: fields.get(&["lastname", "last"]),
        email: fields.get(&["email"]),
        phone: fields.get(&["phone"]),
        status: fields.get(&["status"]).map(|s| UserStatus::parse(&s)),
    };

    if let Some(email) = &patch.email {
        if !is_email(email) {
            errors.push(FormError::Invalid {
                field: "email",
                reason: format!("'{}' is not an email address", email),
            });
        }
    }
    if let Some(UserStatus::Other(raw)) = &patch.status {
        errors.push(FormError::Invalid {
            field: "status",
            reason: format!("'{}' is not Active, Inactive or Suspended", raw),
        });
    }
    if patch.is_empty() && errors.is_empty() {
        errors.push(FormError::Required { field: "at least one field" });
    }

    if errors.is_empty() {
        Ok(patch)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fields(args: &[&str]) -> Fields {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        Fields::parse(&args).unwrap()
    }

    #[test]
    fn test_fields_fold_keys_and_accumulate() {
        let f = fields(&["firstName=Ada", "image=a.png", "images=https://x/b.png,https://x/c.png"]);
        assert_eq!(f.get(&["firstname"]).as_deref(), Some("Ada"));
        assert_eq!(f.all(&["images", "image"]).len(), 3);
        assert!(Fields::parse(&["oops".to_string()]).is_err());
    }

    #[test]
    fn test_valid_product_with_remote_image() {
        let form = ProductForm::from_fields(&fields(&[
            "name=Reseller Hosting",
            "price=15,000",
            "description=Managed reseller hosting plan",
            "image=https://cdn.example.com/p.webp",
            "category=Hosting",
        ]));
        let product = form.validate().unwrap();
        assert_eq!(product.price, 15000.0);
        assert_eq!(product.status, ProductStatus::Active);
        assert_eq!(product.images, vec!["https://cdn.example.com/p.webp"]);
    }

    #[test]
    fn test_product_reports_every_problem() {
        let form = ProductForm::from_fields(&fields(&["name=X", "price=-1", "description=short"]));
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                FormError::TooShort { field: "name", min: 2 },
                FormError::TooShort { field: "description", min: 10 },
                FormError::Invalid {
                    field: "price",
                    reason: "must be 0 or more".to_string()
                },
                FormError::Required { field: "images" },
            ]
        );
    }

    #[test]
    fn test_too_many_images() {
        let mut form = ProductForm::from_fields(&fields(&[
            "name=Domain",
            "price=0",
            "description=Domain registration",
        ]));
        form.images = (0..9).map(|i| format!("https://x/{}.png", i)).collect();
        let errors = form.validate().unwrap_err();
        assert!(matches!(errors[0], FormError::Invalid { field: "images", .. }));
    }

    #[test]
    fn test_local_image_inlined_as_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.PNG");
        std::fs::File::create(&path).unwrap().write_all(b"png").unwrap();
        let url = resolve_image(path.to_str().unwrap()).unwrap();
        assert_eq!(url, "data:image/png;base64,cG5n");
    }

    #[test]
    fn test_local_image_type_and_size_limits() {
        let dir = tempfile::tempdir().unwrap();
        let gif = dir.path().join("anim.gif");
        std::fs::write(&gif, b"gif").unwrap();
        assert!(matches!(
            resolve_image(gif.to_str().unwrap()),
            Err(FormError::Unsupported { .. })
        ));

        let big = dir.path().join("big.jpg");
        std::fs::write(&big, vec![0u8; (MAX_IMAGE_BYTES + 1) as usize]).unwrap();
        let err = resolve_image(big.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("500KB"));

        let missing = dir.path().join("missing.png");
        assert!(matches!(
            resolve_image(missing.to_str().unwrap()),
            Err(FormError::Invalid { .. })
        ));
    }

    #[test]
    fn test_user_form() {
        let user = UserForm::from_fields(&fields(&[
            "first=Ada",
            "last_name=Obi",
            "email=ada@example.com",
        ]))
        .validate()
        .unwrap();
        assert_eq!(user.first_name, "Ada");
        assert!(user.phone.is_none());

        let errors = UserForm::from_fields(&fields(&["first=Ada", "email=not-an-email"]))
            .validate()
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0], FormError::Required { field: "last name" });
    }

    #[test]
    fn test_user_patch() {
        let patch = user_patch(&fields(&["phone=0800", "status=inactive"])).unwrap();
        assert_eq!(patch.phone.as_deref(), Some("0800"));
        assert_eq!(patch.status, Some(UserStatus::Inactive));

        assert!(user_patch(&Fields::default()).is_err());
        assert!(user_patch(&fields(&["status=banned"])).is_err());
    }
}
