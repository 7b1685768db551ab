//! # Route Modules
//!
//! | Route | Module | Auth |
//! |-------|--------|------|
//! | `POST /admin/upload/app` | [`upload`] | Basic |
//! | `GET /apps/:app_name/latest` | [`apps`] | none |
//! | `GET /apps/:app_name/:app_version/:app_build/:file_name` | [`apps`] | none |

pub mod apps;
pub mod upload;
