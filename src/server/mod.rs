//! HTTP server - the PSBT builder over axum
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | `/` | GET | API description |
//! | `/health` | GET | `Server is running` |
//! | `/api/create-mint-psbt` | POST | `{feeRate, mintData, userAddress}` → `{success, psbt, format}` |

mod routes;

pub use routes::{create_router, create_router_with_name, AppState};
