use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a type that can be requested from or provided by a scope.
///
/// Markers are built for any `'static` type, sized or not, so trait objects such as
/// `dyn Repository<User>` can be used as aliases. Two markers are equal when they refer to
/// the same type; every generic parameterization is a distinct marker.
///
/// # Examples
///
/// ```rust
/// use pid::TypeMarker;
///
/// trait Repository<T> {}
/// struct User;
/// struct Order;
///
/// assert_eq!(TypeMarker::of::<String>(), TypeMarker::of::<String>());
/// assert_ne!(
///     TypeMarker::of::<dyn Repository<User>>(),
///     TypeMarker::of::<dyn Repository<Order>>(),
/// );
/// ```
#[derive(Clone, Copy)]
pub struct TypeMarker {
    id: TypeId,
    name: &'static str,
}

impl TypeMarker {
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, as reported by [`std::any::type_name`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn is_tag(&self) -> bool {
        self.id == TypeId::of::<Tag>()
    }
}

impl PartialEq for TypeMarker {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeMarker {}

impl Hash for TypeMarker {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Scoping key of a resolution.
///
/// Resolving the same root under two different tags produces two independent instance
/// graphs. A component that declares a dependency of type `Tag` receives the tag it is
/// being resolved under.
///
/// # Examples
///
/// ```rust
/// use pid::Tag;
///
/// let untagged = Tag::none();
/// let request: Tag = "request-1".into();
///
/// assert!(untagged.is_none());
/// assert_eq!(request.as_str(), Some("request-1"));
/// assert_ne!(untagged, request);
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Tag(Option<Arc<str>>);

impl Tag {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn new(value: impl AsRef<str>) -> Self {
        Self(Some(Arc::from(value.as_ref())))
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Self(Some(Arc::from(value)))
    }
}

impl From<Option<&str>> for Tag {
    fn from(value: Option<&str>) -> Self {
        value.map(Self::new).unwrap_or_default()
    }
}

impl From<&Tag> for Tag {
    fn from(value: &Tag) -> Self {
        value.clone()
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => write!(f, "Tag({v:?})"),
            None => f.write_str("Tag(None)"),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => f.write_str(v),
            None => f.write_str("<untagged>"),
        }
    }
}
