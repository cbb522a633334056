// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Modeled values and the shared handles that hold them.
//!
//! A modeled type implements [`Model`] (its single traversal method) and [`Tagged`] (its type
//! tag). Values live in the graph behind shared handles:
//!
//! - [`Node`] is type-erased and is what every engine works with;
//! - [`Shared<T>`] is a typed view of a node whose concrete type is known to be `T`, and is what
//!   modeled types store in their nested properties.
//!
//! The same instance may be reachable through several properties, or even through itself.
//! Identity is the handle's allocation: two handles are the same value iff [`Node::ptr_eq`].
use crate::{error::Error, primitive::Primitive, traversal::{SlotError, Visitor}};
use std::{
    any::{Any, TypeId},
    cell::{Ref, RefCell, RefMut},
    fmt,
    marker::PhantomData,
    rc::Rc,
};

/// Upcast to [`Any`] so that type-erased values can be downcast again.
///
/// Implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A value that describes its own properties to a [`Visitor`].
///
/// `traverse` must call [`Visitor::begin`], then exactly one visitor method per property in a
/// fixed order, then [`Visitor::end`]. It must not modify `self` on its own; only the slots it
/// hands to the visitor may change it.
///
/// ```rust
/// use elevated::{Error, Model, Tagged, Visitor};
///
/// #[derive(Debug, Default)]
/// struct Point {
///     x: Option<i64>,
///     y: Option<i64>,
/// }
///
/// impl Tagged for Point {
///     const TAG: &'static str = "Point";
/// }
///
/// impl Model for Point {
///     fn traverse(&mut self, visitor: &mut dyn Visitor) -> Result<(), Error> {
///         visitor.begin(Self::TAG)?;
///         visitor.primitive("x", &mut self.x)?;
///         visitor.primitive("y", &mut self.y)?;
///         visitor.end()
///     }
/// }
/// ```
pub trait Model: AsAny + fmt::Debug {
    fn traverse(&mut self, visitor: &mut dyn Visitor) -> Result<(), Error>;

    /// A stable identity that outlives any single graph, such as a database key.
    ///
    /// The comparator orders values that both have one by this identity alone.
    fn global_id(&self) -> Option<Primitive> {
        None
    }
}

/// Associates a modeled type with its type tag.
pub trait Tagged {
    const TAG: &'static str;
}

/// Identity of a [`Node`], valid for as long as the node is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// A type-erased, shared handle to a modeled value.
#[derive(Clone)]
pub struct Node {
    cell: Rc<RefCell<dyn Model>>,
    type_id: TypeId,
    type_name: &'static str,
}

impl Node {
    pub fn new<T: Model>(value: T) -> Self {
        Self {
            cell: Rc::new(RefCell::new(value)),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> NodeId {
        NodeId(Rc::as_ptr(&self.cell) as *const () as usize)
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        self.id() == other.id()
    }

    /// The concrete type of the value, available without borrowing it.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Model>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Panics if the value is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, dyn Model> {
        self.cell.borrow()
    }

    /// Panics if the value is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, dyn Model> {
        self.cell.borrow_mut()
    }

    /// Runs the value's traversal method with `visitor`.
    pub fn traverse(&self, visitor: &mut dyn Visitor) -> Result<(), Error> {
        self.cell.borrow_mut().traverse(visitor)
    }

    pub fn global_id(&self) -> Option<Primitive> {
        self.cell.borrow().global_id()
    }

    /// Recovers the typed view, or hands the node back if it holds another type.
    pub fn downcast<T: Model>(self) -> Result<Shared<T>, Node> {
        if self.is::<T>() {
            Ok(Shared {
                node: self,
                _type: PhantomData,
            })
        } else {
            Err(self)
        }
    }
}

// Printing the pointee could recurse forever in cyclic graphs.
impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node<{}>@{:#x}", self.type_name, self.id().0)
    }
}

/// A typed view of a [`Node`] whose value is known to be a `T`.
pub struct Shared<T> {
    node: Node,
    _type: PhantomData<fn() -> T>,
}

impl<T: Model> Shared<T> {
    pub fn new(value: T) -> Self {
        Self {
            node: Node::new(value),
            _type: PhantomData,
        }
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        Ref::map(self.node.cell.borrow(), |value| {
            (*value)
                .as_any()
                .downcast_ref::<T>()
                .expect("a shared handle always holds its own type")
        })
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        RefMut::map(self.node.cell.borrow_mut(), |value| {
            (*value)
                .as_any_mut()
                .downcast_mut::<T>()
                .expect("a shared handle always holds its own type")
        })
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn into_node(self) -> Node {
        self.node
    }

    pub fn ptr_eq(&self, other: &Shared<T>) -> bool {
        self.node.ptr_eq(&other.node)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node.fmt(f)
    }
}

impl<T: Model> From<Shared<T>> for Node {
    fn from(value: Shared<T>) -> Self {
        value.node
    }
}

/// Handles that can be stored in nested properties.
///
/// Implemented by [`Shared<T>`], which only accepts values of type `T` and defaults fresh
/// elements to `T::TAG`, and by [`Node`], which accepts anything and has no default.
pub trait Element: Clone + 'static {
    /// The tag used to construct a fresh element when the input does not name one.
    fn default_tag() -> Option<&'static str>;

    fn as_node(&self) -> &Node;

    fn from_node(node: Node) -> Result<Self, SlotError>;
}

impl Element for Node {
    fn default_tag() -> Option<&'static str> {
        None
    }

    fn as_node(&self) -> &Node {
        self
    }

    fn from_node(node: Node) -> Result<Self, SlotError> {
        Ok(node)
    }
}

impl<T: Model + Tagged> Element for Shared<T> {
    fn default_tag() -> Option<&'static str> {
        Some(T::TAG)
    }

    fn as_node(&self) -> &Node {
        &self.node
    }

    fn from_node(node: Node) -> Result<Self, SlotError> {
        node.downcast().map_err(|node| SlotError::Mismatch {
            expected: std::any::type_name::<T>(),
            found: node.type_name().to_string(),
        })
    }
}
