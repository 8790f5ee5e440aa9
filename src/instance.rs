//! Default instances
//!
//! Builds a placeholder value shaped like a schema, e.g. to seed an editor
//! form. A declared `default` always wins; otherwise each type contributes
//! its zero value and objects are filled property by property.

use serde_json::{Map, Value};

use crate::schema::{Definitions, Schema, TypeName, TypeSpec};

impl Schema {
    /// A value shaped like this schema, resolving `$ref` against the schema's
    /// own definitions only
    pub fn default_value(&self) -> Value {
        self.default_value_with(&Definitions::new())
    }

    /// Like [`Schema::default_value`], consulting `definitions` first when
    /// resolving `$ref`
    pub fn default_value_with(&self, definitions: &Definitions) -> Value {
        let mut builder = Builder {
            root: self,
            scopes: vec![definitions],
            following: Vec::new(),
        };
        builder.build(self)
    }
}

struct Builder<'a> {
    root: &'a Schema,
    scopes: Vec<&'a Definitions>,
    /// `$ref` names currently being expanded
    following: Vec<&'a str>,
}

impl<'a> Builder<'a> {
    fn build(&mut self, schema: &'a Schema) -> Value {
        if let Some(default) = &schema.default {
            return default.clone();
        }
        match &schema.definitions {
            Some(defs) => {
                self.scopes.push(defs);
                let value = self.shape(schema);
                self.scopes.pop();
                value
            }
            None => self.shape(schema),
        }
    }

    fn shape(&mut self, schema: &'a Schema) -> Value {
        if let Some(allowed) = &schema.enum_values {
            return allowed
                .as_array()
                .and_then(|items| items.first())
                .cloned()
                .unwrap_or(Value::Null);
        }
        let branches = schema
            .one_of
            .as_ref()
            .or(schema.all_of.as_ref())
            .or(schema.any_of.as_ref());
        if let Some(branches) = branches {
            return match branches.first() {
                Some(first) => self.build(first),
                None => Value::Null,
            };
        }
        if let Some(name) = &schema.reference {
            return self.follow(name);
        }

        let first_type = match schema.effective_type().as_deref() {
            Some(TypeSpec::Single(name)) => Some(name.clone()),
            Some(TypeSpec::Union(names)) => names.first().cloned(),
            None => None,
        };
        match first_type {
            Some(TypeName::Boolean) => Value::Bool(true),
            Some(TypeName::Number) | Some(TypeName::Integer) => Value::from(0),
            Some(TypeName::String) => Value::String(String::new()),
            Some(TypeName::Array) => Value::Array(Vec::new()),
            Some(TypeName::Object) => self.object(schema),
            Some(TypeName::Null) | Some(TypeName::Any) | Some(TypeName::Unknown(_)) | None => Value::Null,
        }
    }

    fn object(&mut self, schema: &'a Schema) -> Value {
        let mut map = Map::new();
        for (name, sub) in schema.properties.iter().flatten() {
            map.insert(name.clone(), self.build(sub));
        }
        Value::Object(map)
    }

    /// An unresolved or recursive reference yields an empty object
    fn follow(&mut self, name: &'a str) -> Value {
        if self.following.contains(&name) {
            return Value::Object(Map::new());
        }
        let target = if name == "#" {
            Some(self.root)
        } else {
            let key = name.strip_prefix("#/definitions/").unwrap_or(name);
            self.scopes.iter().find_map(|defs| defs.get(key))
        };
        let Some(target) = target else {
            return Value::Object(Map::new());
        };

        self.following.push(name);
        let value = self.build(target);
        self.following.pop();
        value
    }
}
