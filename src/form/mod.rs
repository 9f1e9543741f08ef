pub mod prefill;
pub mod validation;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Select,
    TextArea,
}

impl FieldKind {
    /// The `type` attribute used when rendering the field as an `<input>`.
    pub fn input_type(&self) -> &'static str {
        match self {
            FieldKind::Email => "email",
            FieldKind::Tel => "tel",
            _ => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub value: String,
    pub default_value: String,
    pub options: Vec<SelectOption>,
}

impl Field {
    fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            value: String::new(),
            default_value: String::new(),
            options: Vec::new(),
        }
    }

    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn email(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Email)
    }

    pub fn tel(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Tel)
    }

    pub fn textarea(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::TextArea)
    }

    /// A select whose first option is an empty placeholder, selected by default.
    pub fn select(name: &str, label: &str, placeholder: &str, options: &[(&str, &str)]) -> Self {
        let mut field = Self::new(name, label, FieldKind::Select);
        field.options.push(SelectOption::new("", placeholder));
        field
            .options
            .extend(options.iter().map(|(value, label)| SelectOption::new(value, label)));
        field
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn reset(&mut self) {
        self.value = self.default_value.clone();
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// The set of inputs a submission flow operates on.
#[derive(Debug, Clone)]
pub struct ContactForm {
    fields: Vec<Field>,
}

impl ContactForm {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// The site's contact form layout.
    pub fn standard() -> Self {
        Self::new(vec![
            Field::text("name", "Full Name").required(),
            Field::email("email", "Email Address").required(),
            Field::tel("phone", "Phone Number"),
            Field::text("company", "Company"),
            Field::select(
                "service",
                "Service Interested In",
                "Select a service",
                &[
                    ("ai-consulting", "AI Consulting"),
                    ("machine-learning", "Machine Learning Solutions"),
                    ("web-development", "Web Development"),
                    ("mobile-app-development", "Mobile App Development"),
                    ("cloud-services", "Cloud Services"),
                    ("data-analytics", "Data Analytics"),
                    ("other", "Other"),
                ],
            )
            .required(),
            Field::select(
                "budget",
                "Budget Range",
                "Select budget",
                &[
                    ("under-1l", "Under ₹1 Lakh"),
                    ("1l-5l", "₹1 - 5 Lakh"),
                    ("5l-10l", "₹5 - 10 Lakh"),
                    ("above-10l", "Above ₹10 Lakh"),
                ],
            ),
            Field::select(
                "timeline",
                "Project Timeline",
                "Select timeline",
                &[
                    ("immediate", "Immediately"),
                    ("1-3-months", "1 - 3 Months"),
                    ("3-6-months", "3 - 6 Months"),
                    ("flexible", "Flexible"),
                ],
            ),
            Field::textarea("message", "Project Details").required(),
        ])
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.value.as_str())
    }

    /// Set a field's value. Returns false when the form has no such field.
    pub fn set_value(&mut self, name: &str, value: &str) -> bool {
        match self.field_mut(name) {
            Some(field) => {
                field.value = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Copy posted values into the matching fields. Unknown keys are ignored.
    pub fn fill<'a, I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (name, value) in pairs {
            self.set_value(name, value);
        }
    }

    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.reset();
        }
    }

    /// True when every field holds its default value.
    pub fn is_pristine(&self) -> bool {
        self.fields.iter().all(|f| f.value == f.default_value)
    }
}
