//! Runtime value model.
//!
//! Patterns operate over values whose concrete type is only known at run
//! time. The host describes its type lattice through two traits:
//!
//! - [`Object`] is implemented by every concrete type that can flow through a
//!   pattern. It reports the value's own [`TypeTag`], the tags of its
//!   supertypes (interfaces, abstract parents) and structural equality.
//! - [`Type`] is implemented by anything usable as the `T` of a
//!   `Pattern<T>`: every sized `Object` (via downcast), `dyn Object` (the
//!   root) and host interface trait objects such as `dyn PlanNode`.
//!
//! [`Value`] is the handle patterns pass around: either null or a shared
//! `Arc<dyn Object>`. Null is a legitimate input: most patterns reject it,
//! a few (`is_null`, `nullable`, raw extractors) accept it.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use smallvec::SmallVec;

/// Inline storage for a value's type closure.
pub type TypeTags = SmallVec<[TypeTag; 4]>;

/// Identity of a (possibly unsized) Rust type.
///
/// Equality and hashing use the `TypeId` only; the name is kept for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// Tag of `T`. Works for trait objects, e.g. `TypeTag::of::<dyn PlanNode>()`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeTag {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Tag of the root type every non-null value belongs to.
    #[inline]
    pub fn object() -> Self {
        Self::of::<dyn Object>()
    }

    /// Readable type name.
    #[inline]
    pub fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeTag {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.name)
    }
}

/// A runtime value that patterns can inspect.
///
/// Implement with [`impl_object!`](crate::impl_object) for types that are
/// `PartialEq + Debug + Send + Sync + 'static`.
pub trait Object: Any + fmt::Debug + Send + Sync {
    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Tag of the value's concrete type.
    fn type_tag(&self) -> TypeTag;

    /// Tags of every supertype this value is an instance of.
    ///
    /// The concrete tag and the root tag are added by
    /// [`type_closure`](trait.Object.html#method.type_closure); list only
    /// the intermediate types here.
    fn supertypes(&self) -> TypeTags {
        TypeTags::new()
    }

    /// Structural equality. Values of different concrete types are unequal.
    fn equals(&self, other: &dyn Object) -> bool;
}

impl dyn Object {
    /// Every tag describing this value: its own tag, its supertypes and the
    /// root tag, without duplicates.
    pub fn type_closure(&self) -> TypeTags {
        let mut tags = TypeTags::new();
        tags.push(self.type_tag());
        for tag in self.supertypes() {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        let root = TypeTag::object();
        if !tags.contains(&root) {
            tags.push(root);
        }
        tags
    }

    /// Downcast to a concrete type.
    #[inline]
    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A type that patterns can be parameterized over.
///
/// `narrow` is the host's `instanceof` + cast: it returns `Some` exactly when
/// the object is an instance of `Self`, including through subtyping. It must
/// agree with the tags the object reports from [`Object::type_closure`].
pub trait Type: 'static {
    /// Tag under which patterns scoped to this type are indexed.
    fn tag() -> TypeTag;

    /// View `object` as `Self` if it is an instance of it.
    fn narrow<'a>(object: &'a (dyn Object + 'static)) -> Option<&'a Self>;
}

impl<T: Object> Type for T {
    #[inline]
    fn tag() -> TypeTag {
        TypeTag::of::<T>()
    }

    #[inline]
    fn narrow<'a>(object: &'a (dyn Object + 'static)) -> Option<&'a Self> {
        object.as_any().downcast_ref::<T>()
    }
}

impl Type for dyn Object {
    #[inline]
    fn tag() -> TypeTag {
        TypeTag::object()
    }

    #[inline]
    fn narrow<'a>(object: &'a (dyn Object + 'static)) -> Option<&'a Self> {
        Some(object)
    }
}

/// Implement [`Object`] for a `PartialEq + Debug` type.
///
/// Supertypes are listed after a colon:
///
/// ```text
/// impl_object!(ProjectNode: dyn SingleSourcePlanNode, dyn PlanNode);
/// ```
#[macro_export]
macro_rules! impl_object {
    ($ty:ty $(: $($supertype:ty),+ $(,)?)?) => {
        impl $crate::Object for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn type_tag(&self) -> $crate::TypeTag {
                $crate::TypeTag::of::<$ty>()
            }

            fn supertypes(&self) -> $crate::TypeTags {
                $crate::TypeTags::from_slice(&[$($($crate::TypeTag::of::<$supertype>()),+)?])
            }

            fn equals(&self, other: &dyn $crate::Object) -> bool {
                other
                    .as_any()
                    .downcast_ref::<$ty>()
                    .is_some_and(|other| self == other)
            }
        }
    };
}

macro_rules! builtin_objects {
    ($($ty:ty),+ $(,)?) => {
        $(crate::impl_object!($ty);)+
    };
}

builtin_objects!(
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    bool,
    char,
    (),
    String,
    &'static str,
);

impl<T: Object + PartialEq> Object for Vec<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::of::<Vec<T>>()
    }

    fn equals(&self, other: &dyn Object) -> bool {
        other
            .as_any()
            .downcast_ref::<Vec<T>>()
            .is_some_and(|other| self == other)
    }
}

/// A nullable, cheaply clonable handle to a runtime value.
#[derive(Clone, Default)]
pub struct Value(Option<Arc<dyn Object>>);

impl Value {
    /// The null value.
    #[inline]
    pub const fn null() -> Self {
        Value(None)
    }

    /// Wrap an owned object.
    pub fn new<T: Object>(object: T) -> Self {
        Value(Some(Arc::new(object)))
    }

    /// Wrap an already shared object.
    #[inline]
    pub fn from_arc(object: Arc<dyn Object>) -> Self {
        Value(Some(object))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// The underlying object, `None` for null.
    #[inline]
    pub fn object(&self) -> Option<&(dyn Object + 'static)> {
        self.0.as_deref()
    }

    /// Shared handle to the underlying object, `None` for null.
    pub fn shared(&self) -> Option<Arc<dyn Object>> {
        self.0.clone()
    }

    /// View the value as `T`; `None` for null or a non-instance.
    #[inline]
    pub fn narrow<T: Type + ?Sized>(&self) -> Option<&T> {
        self.object().and_then(T::narrow)
    }

    /// Name of the concrete type, `"null"` for null.
    pub fn type_name(&self) -> &'static str {
        match self.object() {
            Some(object) => object.type_tag().name(),
            None => "null",
        }
    }

    /// Identity comparison: both null, or both the same allocation.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self.object(), other.object()) {
            (None, None) => true,
            (Some(a), Some(b)) => a.equals(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.object() {
            Some(object) => fmt::Debug::fmt(object, f),
            None => f.write_str("null"),
        }
    }
}

impl<T: Object> From<T> for Value {
    fn from(object: T) -> Self {
        Value::new(object)
    }
}

/// Conversion used by projections and extractors, which may return either
/// a fresh object or an existing [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl<T: Object> IntoValue for T {
    #[inline]
    fn into_value(self) -> Value {
        Value::new(self)
    }
}

impl IntoValue for Value {
    #[inline]
    fn into_value(self) -> Value {
        self
    }
}
