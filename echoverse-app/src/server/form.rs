use crate::server::ServerError;
use axum::{Form as AxumForm, extract::FromRequest};

#[derive(FromRequest, Debug, Clone, Copy, Default)]
#[from_request(via(AxumForm), rejection(ServerError))]
pub struct Form<T>(pub T);
