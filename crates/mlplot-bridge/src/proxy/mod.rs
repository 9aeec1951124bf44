//! Worker-side stand-ins for owner objects.
//!
//! A [`ProxySchema`] declares which members of a kind are attributes and
//! which are methods. [`ProxyClass`] binds a schema to one endpoint and hands
//! out descriptors; every [`Proxy`] created through it routes its member
//! access through that endpoint only.

mod container;
mod macros;

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use self::container::{ProxyContainer, ProxyHandle};

use crate::endpoint::Requester;
use crate::error::ProxyError;
use crate::value::{CallArgs, ObjectIndex, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Attribute,
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute => f.write_str("an attribute"),
            Self::Method => f.write_str("a method"),
        }
    }
}

#[derive(Debug)]
pub struct ProxySchema {
    pub kind: &'static str,
    pub members: &'static [(&'static str, MemberKind)],
}

impl ProxySchema {
    pub const fn new(kind: &'static str, members: &'static [(&'static str, MemberKind)]) -> Self {
        Self { kind, members }
    }

    pub fn member(&self, name: &str) -> Option<(&'static str, MemberKind)> {
        self.members
            .iter()
            .find(|(member, _)| *member == name)
            .copied()
    }
}

/// Descriptor factory bound to exactly one endpoint.
pub struct ProxyClass {
    schema: &'static ProxySchema,
    endpoint: Rc<Requester>,
}

impl fmt::Debug for ProxyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyClass")
            .field("kind", &self.schema.kind)
            .field("members", &self.schema.members.len())
            .finish()
    }
}

impl ProxyClass {
    pub fn bind(
        schema: &'static ProxySchema,
        endpoint: Rc<Requester>,
    ) -> Result<Rc<Self>, ProxyError> {
        if endpoint.kind() != schema.kind {
            return Err(ProxyError::KindMismatch {
                expected: schema.kind.to_string(),
                actual: endpoint.kind().to_string(),
            });
        }
        Ok(Rc::new(Self { schema, endpoint }))
    }

    pub fn kind(&self) -> &'static str {
        self.schema.kind
    }

    pub fn schema(&self) -> &'static ProxySchema {
        self.schema
    }

    pub fn endpoint(&self) -> &Requester {
        &self.endpoint
    }

    pub fn attribute<T>(self: &Rc<Self>, name: &str) -> Result<AttributeDescriptor<T>, ProxyError> {
        let name = self.member(name, MemberKind::Attribute)?;
        Ok(AttributeDescriptor {
            class: Rc::clone(self),
            name,
            _marker: PhantomData,
        })
    }

    pub fn method(self: &Rc<Self>, name: &str) -> Result<MethodDescriptor, ProxyError> {
        let name = self.member(name, MemberKind::Method)?;
        Ok(MethodDescriptor {
            class: Rc::clone(self),
            name,
        })
    }

    /// Creates a new owner object and returns its proxy.
    pub fn create(self: &Rc<Self>, args: CallArgs) -> Result<Proxy, ProxyError> {
        let index = self.endpoint.create(args)?;
        Ok(Proxy::attach(Rc::clone(self), index))
    }

    fn member(&self, name: &str, expected: MemberKind) -> Result<&'static str, ProxyError> {
        match self.schema.member(name) {
            Some((name, actual)) if actual == expected => Ok(name),
            Some((name, actual)) => Err(ProxyError::WrongMemberKind {
                kind: self.schema.kind.to_string(),
                name: name.to_string(),
                expected,
                actual,
            }),
            None => Err(ProxyError::UnknownMember {
                kind: self.schema.kind.to_string(),
                name: name.to_string(),
            }),
        }
    }

    fn check_owner(&self, proxy: &Proxy, name: &str) -> Result<ObjectIndex, ProxyError> {
        if !std::ptr::eq(self, Rc::as_ptr(&proxy.class)) {
            return Err(ProxyError::ForeignProxy {
                kind: self.schema.kind.to_string(),
                name: name.to_string(),
            });
        }
        proxy.live_index()
    }
}

pub struct AttributeDescriptor<T> {
    class: Rc<ProxyClass>,
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for AttributeDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDescriptor")
            .field("kind", &self.class.kind())
            .field("name", &self.name)
            .finish()
    }
}

impl<T> AttributeDescriptor<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> AttributeDescriptor<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Reads the current value from the owner.
    pub fn get(&self, proxy: &Proxy) -> Result<T, ProxyError> {
        let index = self.class.check_owner(proxy, self.name)?;
        let mut values = self.class.endpoint.read(index, [self.name])?;
        let value = values.pop().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|source| ProxyError::Decode {
            kind: self.class.kind().to_string(),
            name: self.name.to_string(),
            source,
        })
    }

    /// Posts the new value and returns without waiting for the owner.
    pub fn set(&self, proxy: &Proxy, value: T) -> Result<(), ProxyError> {
        let index = self.class.check_owner(proxy, self.name)?;
        let value = serde_json::to_value(value).map_err(|source| ProxyError::Encode {
            kind: self.class.kind().to_string(),
            name: self.name.to_string(),
            source,
        })?;
        self.class.endpoint.modify(index, self.name, value)?;
        Ok(())
    }
}

pub struct MethodDescriptor {
    class: Rc<ProxyClass>,
    name: &'static str,
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("kind", &self.class.kind())
            .field("name", &self.name)
            .finish()
    }
}

impl MethodDescriptor {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn bind(&self, proxy: &Proxy) -> Result<BoundMethod, ProxyError> {
        let index = self.class.check_owner(proxy, self.name)?;
        Ok(BoundMethod {
            class: Rc::clone(&self.class),
            index,
            name: self.name,
        })
    }
}

/// A method captured together with the object it targets.
pub struct BoundMethod {
    class: Rc<ProxyClass>,
    index: ObjectIndex,
    name: &'static str,
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMethod")
            .field("kind", &self.class.kind())
            .field("index", &self.index)
            .field("name", &self.name)
            .finish()
    }
}

impl BoundMethod {
    pub fn call(&self, args: CallArgs) -> Result<Value, ProxyError> {
        Ok(self.class.endpoint.invoke(self.index, self.name, args)?)
    }

    pub fn call_as<R: DeserializeOwned>(&self, args: CallArgs) -> Result<R, ProxyError> {
        let value = self.call(args)?;
        serde_json::from_value(value).map_err(|source| ProxyError::Decode {
            kind: self.class.kind().to_string(),
            name: self.name.to_string(),
            source,
        })
    }
}

/// Handle to one owner object of the class it was created through.
pub struct Proxy {
    class: Rc<ProxyClass>,
    index: ObjectIndex,
    deleted: Cell<bool>,
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("kind", &self.class.kind())
            .field("index", &self.index)
            .field("deleted", &self.deleted.get())
            .finish()
    }
}

impl Proxy {
    /// Wraps an index the owner already handed out, e.g. one returned by a
    /// method call.
    pub fn attach(class: Rc<ProxyClass>, index: ObjectIndex) -> Self {
        Self {
            class,
            index,
            deleted: Cell::new(false),
        }
    }

    pub fn index(&self) -> ObjectIndex {
        self.index
    }

    pub fn kind(&self) -> &'static str {
        self.class.kind()
    }

    pub fn class(&self) -> &Rc<ProxyClass> {
        &self.class
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.get()
    }

    pub fn get<T>(&self, name: &str) -> Result<T, ProxyError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.class.attribute::<T>(name)?.get(self)
    }

    pub fn set<T>(&self, name: &str, value: T) -> Result<(), ProxyError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.class.attribute::<T>(name)?.set(self, value)
    }

    pub fn method(&self, name: &str) -> Result<BoundMethod, ProxyError> {
        self.class.method(name)?.bind(self)
    }

    pub fn call(&self, name: &str, args: CallArgs) -> Result<Value, ProxyError> {
        self.method(name)?.call(args)
    }

    pub fn call_as<R: DeserializeOwned>(
        &self,
        name: &str,
        args: CallArgs,
    ) -> Result<R, ProxyError> {
        self.method(name)?.call_as(args)
    }

    /// Destroys the owner object. The proxy is unusable afterwards.
    pub fn delete(&self) -> Result<(), ProxyError> {
        let index = self.live_index()?;
        self.class.endpoint.delete(index)?;
        self.deleted.set(true);
        Ok(())
    }

    fn live_index(&self) -> Result<ObjectIndex, ProxyError> {
        if self.deleted.get() {
            return Err(ProxyError::Deleted {
                kind: self.class.kind().to_string(),
                index: self.index,
            });
        }
        Ok(self.index)
    }
}

impl ProxyHandle for Proxy {
    fn index(&self) -> ObjectIndex {
        self.index
    }
}
