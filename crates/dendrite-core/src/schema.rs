//! Turns Rust type information into the constrained JSON Schema that is
//! shipped alongside every prompt.
//!
//! The raw document is derived with [`schemars`] (fully inlined, draft-07)
//! and then normalised into a much smaller vocabulary that models follow
//! reliably:
//!
//! * scalars become `integer`, `number`, `boolean` or `string`,
//! * sequences become `{ "type": "array", "items": … }`,
//! * string-keyed maps become `{ "type": "object", "additionalProperties": … }`,
//! * records become `{ "type": "object", "properties": …, "required": …,
//!   "additionalProperties": false }`,
//! * anything else degrades to a bare `{ "type": "object" }`.
//!
//! Field metadata follows the usual serde conventions: the emitted name is the
//! serde name (`rename`, `rename_all`), a field is optional when it is an
//! `Option<T>` or carries `#[serde(default)]`, and `#[serde(skip)]` removes it
//! entirely. `#[schemars(required)]` forces an `Option<T>` back into
//! `required`. Doc comments are forwarded as `description`.
//!
//! The output is a pure function of the type: keys are emitted in canonical
//! order and `required` follows field declaration order, so two generations
//! of the same type are byte-identical.
//!
//! ```rust
//! use dendrite_core::schema::generate_schema;
//! use schemars::JsonSchema;
//!
//! #[derive(JsonSchema)]
//! struct Foo { bar: String, baz: Option<u32> }
//!
//! let schema = generate_schema::<Foo>().unwrap();
//! assert_eq!(schema.to_value()["required"], serde_json::json!(["bar"]));
//! assert_eq!(schema.to_value()["additionalProperties"], serde_json::json!(false));
//! ```

use std::{
    any::TypeId,
    collections::HashMap,
    fmt::Display,
    sync::{Arc, OnceLock, RwLock},
};

use schemars::{
    r#gen::{SchemaGenerator, SchemaSettings},
    schema::{InstanceType, Schema as RawSchema, SchemaObject, SingleOrVec},
    JsonSchema, Map,
};
use serde_json::Value;

use crate::error::{DendriteError, Result};

/// Generated output contract for a result type.
///
/// Holds both the normalised tree and its canonical text; the text is what
/// ends up inside prompts.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    root: SchemaNode,
    text: String,
}

impl Schema {
    /// Derive the schema for `T` without consulting the process-wide cache.
    pub fn generate<T>() -> Result<Self>
    where
        T: JsonSchema + ?Sized,
    {
        // Inline everything so providers never have to resolve `$ref`s.
        let mut settings = SchemaSettings::draft07();
        settings.inline_subschemas = true;
        let raw = SchemaGenerator::new(settings).into_root_schema_for::<T>();

        let mut normalizer = Normalizer {
            definitions: &raw.definitions,
            stack: Vec::new(),
        };
        let root = normalizer.object(&raw.schema)?;

        if !matches!(root.shape, Shape::Object(_)) {
            return Err(DendriteError::SchemaGeneration(format!(
                "`{}` must be a record with named fields to be used as a result type",
                T::schema_name()
            )));
        }

        let text = serde_json::to_string_pretty(&root.to_value())?;
        Ok(Self { root, text })
    }

    /// Canonical schema text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn to_value(&self) -> Value {
        self.root.to_value()
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// The root record. Always present: construction rejects other shapes.
    pub fn object(&self) -> &ObjectSchema {
        match &self.root.shape {
            Shape::Object(object) => object,
            _ => unreachable!("root schema is checked to be an object on construction"),
        }
    }

    /// Field descriptors of the root record, in declaration order.
    pub fn fields(&self) -> Vec<FieldDescriptor> {
        self.object().fields()
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Generate (or fetch the memoised) schema for `T`.
///
/// Types are immutable after declaration, so the result is cached per
/// [`TypeId`] for the lifetime of the process.
pub fn generate_schema<T>() -> Result<Arc<Schema>>
where
    T: JsonSchema + 'static,
{
    static CACHE: OnceLock<RwLock<HashMap<TypeId, Arc<Schema>>>> = OnceLock::new();
    let cache = CACHE.get_or_init(Default::default);
    let id = TypeId::of::<T>();

    if let Some(schema) = cache
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(&id)
    {
        return Ok(Arc::clone(schema));
    }

    let schema = Arc::new(Schema::generate::<T>()?);
    cache
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .entry(id)
        .or_insert_with(|| Arc::clone(&schema));
    Ok(schema)
}

/// One node of the normalised schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub shape: Shape,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Primitive(Primitive),
    /// String restricted to a fixed set of values (unit-variant enums).
    Enum(Vec<String>),
    Array(Box<SchemaNode>),
    /// String-keyed associative container; the node is the value schema.
    Map(Box<SchemaNode>),
    Object(ObjectSchema),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Integer,
    Number,
    Boolean,
    String,
    /// Fallback for shapes the normaliser does not recognise.
    Object,
}

impl Primitive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::Integer => "integer",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
            Primitive::String => "string",
            Primitive::Object => "object",
        }
    }
}

/// A record: named properties in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub required: bool,
    pub schema: SchemaNode,
}

impl ObjectSchema {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Names of the required properties, in declaration order.
    pub fn required(&self) -> impl Iterator<Item = &str> + '_ {
        self.properties
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }

    pub fn fields(&self) -> Vec<FieldDescriptor> {
        self.properties
            .iter()
            .map(|p| FieldDescriptor {
                name: p.name.clone(),
                kind: FieldKind::of(&p.schema.shape),
                optional: !p.required,
            })
            .collect()
    }
}

/// Flattened view of a record field: emitted name, type category and
/// optionality. Excluded fields never produce a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub optional: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Primitive(Primitive),
    Array,
    Map,
    Object,
}

impl FieldKind {
    fn of(shape: &Shape) -> Self {
        match shape {
            Shape::Primitive(p) => FieldKind::Primitive(*p),
            Shape::Enum(_) => FieldKind::Primitive(Primitive::String),
            Shape::Array(_) => FieldKind::Array,
            Shape::Map(_) => FieldKind::Map,
            Shape::Object(_) => FieldKind::Object,
        }
    }
}

impl SchemaNode {
    fn new(shape: Shape, description: Option<String>) -> Self {
        Self { shape, description }
    }

    fn fallback(description: Option<String>) -> Self {
        Self::new(Shape::Primitive(Primitive::Object), description)
    }

    /// Emit the node as JSON. Keys are inserted in a fixed order; with the
    /// default `serde_json` map they also serialise sorted.
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        match &self.shape {
            Shape::Primitive(primitive) => {
                map.insert("type".into(), Value::from(primitive.as_str()));
            }
            Shape::Enum(values) => {
                map.insert("type".into(), Value::from("string"));
                map.insert(
                    "enum".into(),
                    Value::Array(values.iter().cloned().map(Value::from).collect()),
                );
            }
            Shape::Array(items) => {
                map.insert("type".into(), Value::from("array"));
                map.insert("items".into(), items.to_value());
            }
            Shape::Map(values) => {
                map.insert("type".into(), Value::from("object"));
                map.insert("additionalProperties".into(), values.to_value());
            }
            Shape::Object(object) => {
                let mut properties = serde_json::Map::new();
                for property in &object.properties {
                    properties.insert(property.name.clone(), property.schema.to_value());
                }
                map.insert("type".into(), Value::from("object"));
                map.insert("properties".into(), Value::Object(properties));
                map.insert(
                    "required".into(),
                    Value::Array(object.required().map(Value::from).collect()),
                );
                map.insert("additionalProperties".into(), Value::Bool(false));
            }
        }
        if let Some(description) = &self.description {
            map.insert("description".into(), Value::from(description.as_str()));
        }
        Value::Object(map)
    }
}

/// Walks a schemars document and produces the constrained tree.
struct Normalizer<'a> {
    definitions: &'a Map<String, RawSchema>,
    /// Definitions currently being expanded; a repeat means recursion.
    stack: Vec<String>,
}

impl Normalizer<'_> {
    fn node(&mut self, schema: &RawSchema) -> Result<SchemaNode> {
        match schema {
            RawSchema::Object(object) => self.object(object),
            RawSchema::Bool(_) => Ok(SchemaNode::fallback(None)),
        }
    }

    fn object(&mut self, object: &SchemaObject) -> Result<SchemaNode> {
        let description = object
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.description.clone());

        if let Some(reference) = &object.reference {
            let mut node = self.resolve(reference)?;
            if description.is_some() {
                node.description = description;
            }
            return Ok(node);
        }

        let instance_type = match &object.instance_type {
            Some(SingleOrVec::Single(ty)) => Some(ty.as_ref().clone()),
            Some(SingleOrVec::Vec(types)) => {
                types.iter().find(|ty| **ty != InstanceType::Null).cloned()
            }
            None => None,
        };

        let shape = match instance_type {
            Some(InstanceType::Integer) => Shape::Primitive(Primitive::Integer),
            Some(InstanceType::Number) => Shape::Primitive(Primitive::Number),
            Some(InstanceType::Boolean) => Shape::Primitive(Primitive::Boolean),
            Some(InstanceType::String) => match string_enum(object) {
                Some(values) => Shape::Enum(values),
                None => Shape::Primitive(Primitive::String),
            },
            Some(InstanceType::Array) => {
                let items = match object.array.as_ref().and_then(|a| a.items.as_ref()) {
                    Some(SingleOrVec::Single(item)) => self.node(item)?,
                    _ => SchemaNode::fallback(None),
                };
                Shape::Array(Box::new(items))
            }
            Some(InstanceType::Object) => self.record_or_map(object)?,
            Some(InstanceType::Null) => Shape::Primitive(Primitive::Object),
            None => return self.untyped(object, description),
        };

        Ok(SchemaNode::new(shape, description))
    }

    fn record_or_map(&mut self, object: &SchemaObject) -> Result<Shape> {
        let Some(validation) = object.object.as_deref() else {
            return Ok(Shape::Object(ObjectSchema::default()));
        };

        if validation.properties.is_empty() {
            if let Some(values) = validation.additional_properties.as_deref() {
                if !matches!(values, RawSchema::Bool(false)) {
                    return Ok(Shape::Map(Box::new(self.node(values)?)));
                }
            }
        }

        let mut properties = Vec::with_capacity(validation.properties.len());
        for (name, schema) in &validation.properties {
            properties.push(Property {
                name: name.clone(),
                required: validation.required.contains(name),
                schema: self.node(schema)?,
            });
        }
        Ok(Shape::Object(ObjectSchema { properties }))
    }

    /// Schemas without `type`: `Option<T>` around a reference (`anyOf`),
    /// documented unit enums (`oneOf`), described references (`allOf`).
    fn untyped(
        &mut self,
        object: &SchemaObject,
        description: Option<String>,
    ) -> Result<SchemaNode> {
        if let Some(values) = string_enum(object) {
            return Ok(SchemaNode::new(Shape::Enum(values), description));
        }

        let Some(subschemas) = object.subschemas.as_deref() else {
            return Ok(SchemaNode::fallback(description));
        };

        let branches: Vec<&RawSchema> = [
            &subschemas.all_of,
            &subschemas.any_of,
            &subschemas.one_of,
        ]
        .into_iter()
        .flatten()
        .flatten()
        .filter(|schema| !is_null(schema))
        .collect();

        match branches.as_slice() {
            [] => Ok(SchemaNode::fallback(description)),
            [single] => {
                let mut node = self.node(single)?;
                if description.is_some() {
                    node.description = description;
                }
                Ok(node)
            }
            many => {
                let mut values = Vec::new();
                for branch in many {
                    match self.node(branch)?.shape {
                        Shape::Enum(branch_values) => values.extend(branch_values),
                        _ => return Ok(SchemaNode::fallback(description)),
                    }
                }
                Ok(SchemaNode::new(Shape::Enum(values), description))
            }
        }
    }

    fn resolve(&mut self, reference: &str) -> Result<SchemaNode> {
        let name = reference.rsplit('/').next().unwrap_or(reference).to_owned();

        if self.stack.contains(&name) {
            return Err(DendriteError::SchemaGeneration(format!(
                "type `{name}` is recursive and cannot be expressed as an inline schema"
            )));
        }

        let definition = self.definitions.get(&name).ok_or_else(|| {
            DendriteError::SchemaGeneration(format!("unresolved schema reference `{reference}`"))
        })?;

        self.stack.push(name);
        let node = self.node(definition);
        self.stack.pop();
        node
    }
}

fn string_enum(object: &SchemaObject) -> Option<Vec<String>> {
    let values = object.enum_values.as_ref()?;
    let strings: Vec<String> = values
        .iter()
        .filter(|value| !value.is_null())
        .map(|value| value.as_str().map(str::to_owned))
        .collect::<Option<_>>()?;
    (!strings.is_empty()).then_some(strings)
}

fn is_null(schema: &RawSchema) -> bool {
    match schema {
        RawSchema::Object(object) => matches!(
            &object.instance_type,
            Some(SingleOrVec::Single(ty)) if **ty == InstanceType::Null
        ),
        RawSchema::Bool(_) => false,
    }
}
