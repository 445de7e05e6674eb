//! Round-trip conversion of [STAC](https://stacspec.org) Items between their storage form and the
//! form a CMS map widget edits.
//!
//! STAC Items are GeoJSON Features, and the STAC specification requires `geometry` to be a JSON
//! object. Map widgets in git-backed CMS editors instead read and write geometry as a JSON
//! string. This crate provides the custom format that sits at the file boundary:
//! [`load`] turns stored text into an editable [`Record`] and [`save`] turns an edited record back
//! into stored text.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub mod error;
pub mod fix;
pub mod format;
mod geometry;
mod record;
pub mod registry;

pub use error::{StacFormatError, StacFormatResult};
pub use fix::{fix_item, fix_item_with_options, remove_empty_strings, Fix, FixOutcome};
pub use format::{load, save, GeometryConversion, StacFormatOptions, StacJsonFormat};
pub use geometry::Geometry;
pub use record::{Record, DISCRIMINATOR_FIELD};
pub use registry::{register_stac_format, CustomFormat, FormatRegistry, SerializationKind};
