//! # Repository Module
//!
//! Database repository implementations for Shopkeep.
//!
//! ## Repository Pattern
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                  │
//! │                                                                  │
//! │  Caller                                                          │
//! │     │   db.products().get_by_sku("COLA-330")                     │
//! │     ▼                                                            │
//! │  ProductRepository                                               │
//! │  ├── get_by_id(&self, id)                                        │
//! │  ├── insert(&self, product, performed_by)                        │
//! │  └── update(&self, product)                                      │
//! │     │   SQL query                                                │
//! │     ▼                                                            │
//! │  SQLite Database                                                 │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories cover CRUD and read paths. Stock-mutating writes live in
//! the [`crate::ledger`] and [`crate::sales`] engines, which run their own
//! transactions; repositories never touch `products.current_stock` (the
//! one exception being product creation, which seeds opening stock through
//! a ledger entry in the same transaction).
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product catalog CRUD
//! - [`customer::CustomerRepository`] - Customer CRUD
//! - [`sale::SaleRepository`] - Sale and sale item reads/inserts
//! - [`movement::MovementRepository`] - Ledger read paths

pub mod customer;
pub mod movement;
pub mod product;
pub mod sale;
