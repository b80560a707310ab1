use crate::errors::{RepoError, Result};
use crate::types::{Attributes, Value};

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// What the repository needs from a record type: named field access and a way to
/// rebuild an instance from an attribute map.
pub trait Model: Clone + Default {
    /// Every stored attribute, identity included.
    const FIELDS: &'static [&'static str];
    const ID_FIELD: &'static str = "id";

    /// Current value of `field`, or `None` when the model has no such field.
    fn get(&self, field: &str) -> Option<Value>;

    /// # Errors
    /// `InvalidArgument` for an unknown field, `Model` when the value has the wrong shape.
    fn set(&mut self, field: &str, value: Value) -> Result<()>;

    #[must_use]
    fn has_field(field: &str) -> bool {
        Self::FIELDS.contains(&field)
    }

    #[must_use]
    fn id(&self) -> Value {
        self.get(Self::ID_FIELD).unwrap_or(Value::Null)
    }

    /// # Errors
    /// Propagates [`Model::set`] failures.
    fn set_id(&mut self, id: Value) -> Result<()> {
        self.set(Self::ID_FIELD, id)
    }

    #[must_use]
    fn to_attributes(&self) -> Attributes {
        Self::FIELDS
            .iter()
            .map(|f| ((*f).to_string(), self.get(f).unwrap_or(Value::Null)))
            .collect()
    }

    /// # Errors
    /// Fails on unknown attributes or values the model cannot hold.
    fn from_attributes(attrs: Attributes) -> Result<Self> {
        let mut model = Self::default();
        for (field, value) in attrs {
            model.set(&field, value)?;
        }
        Ok(model)
    }
}

/// Rejects attribute names the model does not declare.
pub(crate) fn verify_attributes<M: Model>(attrs: &Attributes) -> Result<()> {
    match attrs.keys().find(|k| !M::has_field(k)) {
        Some(unknown) => Err(RepoError::invalid(format!("Unknown attribute: {unknown}"))),
        None => Ok(()),
    }
}

/// Round-trips attributes through `M`, coercing storage encodings into model values.
pub(crate) fn normalize<M: Model>(attrs: Attributes) -> Result<Attributes> {
    Ok(M::from_attributes(attrs)?.to_attributes())
}

/// Builds the domain model `D` from a storage model's attributes.
pub(crate) fn project<D: Model>(attrs: Attributes) -> Result<D> {
    let known: Attributes = attrs.into_iter().filter(|(k, _)| D::has_field(k)).collect();
    D::from_attributes(known)
}

/// Coerces only the given attributes through `M`, leaving the rest of a record alone.
pub(crate) fn coerce<M: Model>(attrs: Attributes) -> Result<Attributes> {
    let keys: Vec<String> = attrs.keys().cloned().collect();
    let model = M::from_attributes(attrs)?;
    Ok(keys
        .into_iter()
        .map(|k| {
            let v = model.get(&k).unwrap_or(Value::Null);
            (k, v)
        })
        .collect())
}
