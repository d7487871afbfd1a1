/// Declares an enum that travels on the wire by its canonical upper-case name.
///
/// Decoding also accepts the numeric tag, and anything unrecognized (unknown names, unknown
/// numbers, `null`) becomes the `Unspecified` variant so that newer producers don't break older
/// controllers.  Every enum declared this way must have an `Unspecified` variant.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = ($number:literal, $wire:literal),
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// The canonical wire name of this variant.
            pub fn wire_name(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire, )+
                }
            }

            /// The numeric tag of this variant.
            pub fn number(&self) -> i64 {
                match self {
                    $( $name::$variant => $number, )+
                }
            }

            pub fn from_wire_name(name: &str) -> Option<Self> {
                match name {
                    $( $wire => Some($name::$variant), )+
                    _ => None,
                }
            }

            pub fn from_number(number: i64) -> Option<Self> {
                $(
                    if number == $number {
                        return Some($name::$variant);
                    }
                )+
                None
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::Unspecified
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.wire_name())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                struct WireVisitor;

                impl<'de> serde::de::Visitor<'de> for WireVisitor {
                    type Value = $name;

                    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                        f.write_str(concat!("a ", stringify!($name), " name or number"))
                    }

                    fn visit_str<E>(self, v: &str) -> std::result::Result<$name, E>
                    where
                        E: serde::de::Error,
                    {
                        Ok($name::from_wire_name(v).unwrap_or_default())
                    }

                    fn visit_i64<E>(self, v: i64) -> std::result::Result<$name, E>
                    where
                        E: serde::de::Error,
                    {
                        Ok($name::from_number(v).unwrap_or_default())
                    }

                    fn visit_u64<E>(self, v: u64) -> std::result::Result<$name, E>
                    where
                        E: serde::de::Error,
                    {
                        Ok(i64::try_from(v)
                            .ok()
                            .and_then($name::from_number)
                            .unwrap_or_default())
                    }

                    fn visit_unit<E>(self) -> std::result::Result<$name, E>
                    where
                        E: serde::de::Error,
                    {
                        Ok($name::default())
                    }
                }

                deserializer.deserialize_any(WireVisitor)
            }
        }

        serde_plain::derive_display_from_serialize!($name);
        serde_plain::derive_fromstr_from_deserialize!($name);
    };
}

/// Generates accessors for optional sub-records that hand back a shared empty record when the
/// sub-record is absent, so callers can walk the tree without matching on every level.
macro_rules! record_accessors {
    (
        $owner:ty {
            $( $(#[$meta:meta])* $accessor:ident => $field:ident : $ty:ty, )+
        }
    ) => {
        impl $owner {
            $(
                $(#[$meta])*
                pub fn $accessor(&self) -> &$ty {
                    static EMPTY: std::sync::OnceLock<$ty> = std::sync::OnceLock::new();
                    match &self.$field {
                        Some(record) => record,
                        None => EMPTY.get_or_init(<$ty>::default),
                    }
                }
            )+
        }
    };
}
