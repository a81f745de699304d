use std::any::type_name;
use std::future::Future;

use anyhow::Result;
use serde::Deserialize;
use tracing::{event, trace_span, Instrument, Level};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationInput {
    pub page: u32,
    pub limit: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub meta: Meta,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl Meta {
    pub fn number_of_pages(&self) -> u32 {
        if self.limit == 0 {
            return 1;
        }
        self.total.div_ceil(self.limit) as u32
    }
}

/// Walks all pages of a listing endpoint, starting at page 1 with the maximum page size of 20.
pub async fn fetch_all_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
    F: FnMut(PaginationInput) -> Fut,
    Fut: Future<Output = Result<PaginatedResponse<T>>>,
{
    let mut current_input = PaginationInput { page: 1, limit: 20 };
    let mut all_data = Vec::new();

    let output_parameter_type_name = type_name::<T>();

    let span = trace_span!("pagination");

    let mut total_number_of_pages = 1;

    async move {
        event!(Level::TRACE, "Start downloading all pages of type {}", output_parameter_type_name);

        while current_input.page <= total_number_of_pages {
            let response = fetch_page(current_input.clone()).await?;
            total_number_of_pages = response.meta.number_of_pages();

            event!(Level::TRACE, "Downloaded page {} of {}", current_input.page, total_number_of_pages);

            all_data.extend(response.data);

            current_input.page += 1;
        }

        event!(Level::TRACE, "Done downloading all {} pages", total_number_of_pages);
        Ok(all_data)
    }
    .instrument(span)
    .await
}
