// (c) Copyright 2025 Helsing GmbH. All rights reserved.
/// Implements [`Tagged`](crate::Tagged) and [`Model`](crate::Model) for a struct.
///
/// Each property is listed with its kind (`primitive`, `scalar`, `array` or `map`), in
/// traversal order. Verbatim properties need a handwritten impl.
///
/// ```rust
/// use elevated::{Shared, model};
/// use std::collections::BTreeMap;
///
/// #[derive(Debug, Default)]
/// struct Line {
///     text: Option<String>,
///     number: Option<i64>,
///     next: Option<Shared<Line>>,
///     notes: Vec<Shared<Line>>,
///     labels: BTreeMap<String, Shared<Line>>,
/// }
///
/// model!(Line as "Line" {
///     primitive text,
///     primitive number,
///     scalar next,
///     array notes,
///     map labels,
/// });
///
/// # use elevated::Tagged;
/// assert_eq!(Line::TAG, "Line");
/// ```
#[macro_export]
macro_rules! model {
    (@property $visitor:ident, $this:ident, primitive $field:ident) => {
        $visitor.primitive(::core::stringify!($field), &mut $this.$field)?
    };
    (@property $visitor:ident, $this:ident, scalar $field:ident) => {
        $visitor.scalar(::core::stringify!($field), &mut $this.$field)?
    };
    (@property $visitor:ident, $this:ident, array $field:ident) => {
        $visitor.array(::core::stringify!($field), &mut $this.$field)?
    };
    (@property $visitor:ident, $this:ident, map $field:ident) => {
        $visitor.map(::core::stringify!($field), &mut $this.$field)?
    };
    ($ty:ident as $tag:literal { $($kind:ident $field:ident),* $(,)? }) => {
        impl $crate::Tagged for $ty {
            const TAG: &'static str = $tag;
        }

        impl $crate::Model for $ty {
            fn traverse(
                &mut self,
                visitor: &mut dyn $crate::Visitor,
            ) -> ::core::result::Result<(), $crate::Error> {
                #[allow(unused_variables)]
                let this = self;
                visitor.begin(<$ty as $crate::Tagged>::TAG)?;
                $( $crate::model!(@property visitor, this, $kind $field); )*
                visitor.end()
            }
        }
    };
}

/// Builds a [`Registry`](crate::Registry) of the given types, each registered under its
/// [tag](crate::Tagged::TAG).
///
/// Evaluates to `Result<Registry, Error>`, failing like
/// [`Registry::register`](crate::Registry::register) on duplicates.
///
/// ```rust
/// # use elevated::{Shared, model};
/// # #[derive(Debug, Default)]
/// # struct Leaf { value: Option<i64> }
/// # model!(Leaf as "Leaf" { primitive value });
/// # #[derive(Debug, Default)]
/// # struct Tree { left: Option<Shared<Tree>>, right: Option<Shared<Tree>>, leaf: Option<Shared<Leaf>> }
/// # model!(Tree as "Tree" { scalar left, scalar right, scalar leaf });
/// use elevated::registry;
///
/// let registry = registry![Leaf, Tree]?;
/// assert_eq!(registry.tags(), vec!["Leaf", "Tree"]);
/// assert!(registry![Leaf, Leaf].is_err());
/// # Ok::<(), elevated::Error>(())
/// ```
#[macro_export]
macro_rules! registry {
    ($($ty:ty),* $(,)?) => {
        (|| -> ::core::result::Result<$crate::Registry, $crate::Error> {
            #[allow(unused_mut)]
            let mut registry = $crate::Registry::new();
            $( registry.register_type::<$ty>()?; )*
            ::core::result::Result::Ok(registry)
        })()
    };
}
