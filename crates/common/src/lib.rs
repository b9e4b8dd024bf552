pub mod types;
pub mod utils;
pub mod pagination;

pub use pagination::{paginate, Page, PageWindow, PaginationError, Paginator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }
}
