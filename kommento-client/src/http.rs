use async_trait::async_trait;

use crate::api::{
    AuthToken, Comment, CommentId, CommentPage, CommentService, EditComment, Error, NewComment,
    PageId, SortBy, VoteKind, VoteReceipt, VoteRequest,
};

/// HTTP-backed implementation of the comment service. Retry and token-refresh
/// plumbing live outside this crate; this client does one request per call
/// and reports the server's error envelope verbatim.
pub struct HttpService {
    host: String,
    token: Option<AuthToken>,
    client: reqwest::Client,
}

impl HttpService {
    pub fn new(host: String, token: Option<AuthToken>) -> HttpService {
        HttpService {
            host,
            token,
            client: reqwest::Client::new(),
        }
    }

    pub fn set_token(&mut self, token: Option<AuthToken>) {
        self.token = token;
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token.0),
            None => req,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.host, path)
    }
}

async fn read_json<T>(resp: reqwest::Response) -> Result<T, Error>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let status = resp.status();
    if status.is_success() {
        resp.json()
            .await
            .map_err(|e| Error::Unknown(format!("invalid response body: {e}")))
    } else {
        Err(read_error(resp).await)
    }
}

async fn read_empty(resp: reqwest::Response) -> Result<(), Error> {
    if resp.status().is_success() {
        Ok(())
    } else {
        Err(read_error(resp).await)
    }
}

async fn read_error(resp: reqwest::Response) -> Error {
    let status = resp.status();
    let body = match resp.bytes().await {
        Ok(body) => body,
        Err(e) => return Error::Unknown(format!("reading error response: {e}")),
    };
    match Error::parse(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(?status, "unparseable error response: {e:?}");
            Error::Unknown(format!("request failed with status {status}"))
        }
    }
}

fn transport(e: reqwest::Error) -> Error {
    Error::Unknown(format!("request failed: {e}"))
}

#[async_trait]
impl CommentService for HttpService {
    async fn fetch_comments(
        &self,
        page_id: PageId,
        page: u32,
        limit: u32,
        sort: SortBy,
    ) -> Result<CommentPage, Error> {
        let req = self
            .client
            .get(self.url("comments"))
            .query(&[("page_id", page_id.0.to_string())])
            .query(&[("page", page), ("limit", limit)])
            .query(&[("sort", sort.as_query_param())]);
        read_json(self.authed(req).send().await.map_err(transport)?).await
    }

    async fn create_comment(&self, new: NewComment) -> Result<Comment, Error> {
        let req = self.client.post(self.url("comments")).json(&new);
        read_json(self.authed(req).send().await.map_err(transport)?).await
    }

    async fn update_comment(&self, id: CommentId, edit: EditComment) -> Result<Comment, Error> {
        let req = self
            .client
            .put(self.url(&format!("comments/{}", id.0)))
            .json(&edit);
        read_json(self.authed(req).send().await.map_err(transport)?).await
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), Error> {
        let req = self.client.delete(self.url(&format!("comments/{}", id.0)));
        read_empty(self.authed(req).send().await.map_err(transport)?).await
    }

    async fn vote(&self, id: CommentId, kind: VoteKind) -> Result<VoteReceipt, Error> {
        let req = self
            .client
            .post(self.url(&format!("comments/{}/vote", id.0)))
            .json(&VoteRequest { kind });
        read_json(self.authed(req).send().await.map_err(transport)?).await
    }

    async fn fetch_replies(
        &self,
        parent: CommentId,
        page: u32,
        limit: u32,
        sort: SortBy,
    ) -> Result<CommentPage, Error> {
        let req = self
            .client
            .get(self.url(&format!("comments/{}/replies", parent.0)))
            .query(&[("page", page), ("limit", limit)])
            .query(&[("sort", sort.as_query_param())]);
        read_json(self.authed(req).send().await.map_err(transport)?).await
    }
}
