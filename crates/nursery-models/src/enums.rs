//! Closed vocabularies stored as `TEXT` columns.
//!
//! Each enum serializes to its snake_case database value, round-trips through
//! `FromStr`/`Display`, and binds/decodes directly with sqlx as text. The
//! columns carry matching `CHECK` constraints.
//!
//! ```ignore
//! let status: AttendanceStatus = "early_departure".parse()?;
//! sqlx::query("UPDATE daily_attendance SET status = $1 WHERE id = $2")
//!     .bind(status)
//!     .bind(id)
//!     .execute(db)
//!     .await?;
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid {}", self.value, self.kind)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl Type<sqlx::Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <String as Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <String as Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'q> Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }

        impl<'r> Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as Decode<'r, sqlx::Postgres>>::decode(value)?;
                Ok(s.parse::<$name>()?)
            }
        }

        impl PgHasArrayType for $name {
            fn array_type_info() -> PgTypeInfo {
                <String as PgHasArrayType>::array_type_info()
            }
        }
    };
}

text_enum! {
    UserType {
        Parent => "parent",
        Teacher => "teacher",
        Admin => "admin",
    }
}

text_enum! {
    AdminLevel {
        SuperAdmin => "super_admin",
        Admin => "admin",
        Moderator => "moderator",
    }
}

text_enum! {
    Gender {
        Male => "male",
        Female => "female",
        Other => "other",
    }
}

text_enum! {
    /// Role of a teacher within a class.
    TeacherRole {
        Primary => "primary",
        Assistant => "assistant",
        Substitute => "substitute",
    }
}

text_enum! {
    RelationshipType {
        Mother => "mother",
        Father => "father",
        Guardian => "guardian",
        Other => "other",
    }
}

text_enum! {
    AttendanceStatus {
        Present => "present",
        Absent => "absent",
        Late => "late",
        EarlyDeparture => "early_departure",
    }
}

text_enum! {
    ActivityCategory {
        Literacy => "literacy",
        Numeracy => "numeracy",
        Science => "science",
        Art => "art",
        Music => "music",
        Physical => "physical",
        Social => "social",
        Other => "other",
    }
}

text_enum! {
    ParticipationLevel {
        Excellent => "excellent",
        Good => "good",
        Fair => "fair",
        NeedsImprovement => "needs_improvement",
    }
}

text_enum! {
    EnrollmentRequestStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

text_enum! {
    StoryType {
        Photo => "photo",
        Video => "video",
        File => "file",
        Journal => "journal",
    }
}
