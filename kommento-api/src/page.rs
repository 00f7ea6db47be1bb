use crate::Comment;

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    PartialEq,
    bolero::generator::TypeGenerator,
    serde::Deserialize,
    serde::Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Newest,
    Oldest,
    MostLiked,
    MostDisliked,
}

impl Default for SortBy {
    fn default() -> SortBy {
        SortBy::Newest
    }
}

impl SortBy {
    pub fn as_query_param(self) -> &'static str {
        match self {
            SortBy::Newest => "newest",
            SortBy::Oldest => "oldest",
            SortBy::MostLiked => "most_liked",
            SortBy::MostDisliked => "most_disliked",
        }
    }
}

/// Window over the server-side result set; `total_items` counts all matching
/// comments, not the ones currently resident in any client store.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

impl Pagination {
    pub fn empty(page_size: u32) -> Pagination {
        Pagination {
            page: 1,
            page_size,
            total_pages: 1,
            total_items: 0,
        }
    }

    pub fn compute(page: u32, page_size: u32, total_items: u64) -> Pagination {
        let per_page = u64::from(page_size.max(1));
        let total_pages = ((total_items + per_page - 1) / per_page).max(1) as u32;
        Pagination {
            page,
            page_size,
            total_pages,
            total_items,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    pub pagination: Pagination,
}
