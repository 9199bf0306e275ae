/// Declare an element kind bound to an iblock.
///
/// Without `sections = ...` the kind resolves sections to
/// [`NoSections`](crate::NoSections).
///
/// # Example
/// ```ignore
/// iblock_section!(pub struct Catalog; iblock = 5);
/// iblock_element!(pub struct Product; iblock = 5; sections = Catalog);
/// iblock_element!(pub struct News; iblock = 7);
///
/// let product = ElementModel::<Product>::new(42);
/// ```
#[macro_export]
macro_rules! iblock_element {
    ($(#[$meta:meta])* $vis:vis struct $name:ident; iblock = $iblock:expr; sections = $section:ty $(;)?) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;

        impl $crate::IblockKind for $name {
            fn iblock_id() -> $crate::Id {
                $iblock
            }
        }

        impl $crate::ElementKind for $name {
            type Section = $section;
        }
    };
    ($(#[$meta:meta])* $vis:vis struct $name:ident; iblock = $iblock:expr $(;)?) => {
        $crate::iblock_element!(
            $(#[$meta])* $vis struct $name; iblock = $iblock; sections = $crate::NoSections
        );
    };
}

/// Declare a section kind bound to an iblock.
///
/// # Example
/// ```ignore
/// iblock_section!(pub struct Catalog; iblock = 5);
///
/// let catalog = SectionModel::<Catalog>::new(99);
/// ```
#[macro_export]
macro_rules! iblock_section {
    ($(#[$meta:meta])* $vis:vis struct $name:ident; iblock = $iblock:expr $(;)?) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;

        impl $crate::IblockKind for $name {
            fn iblock_id() -> $crate::Id {
                $iblock
            }
        }

        impl $crate::SectionKind for $name {}
    };
}
