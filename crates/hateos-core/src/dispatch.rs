//! Per-mapping dispatch: selection, relation, negotiation, handler, encoding.

use std::any::{TypeId, type_name};

use bytes::Bytes;
use hateos_codec::{CodecError, Marshall, MarshallContext, MediaType, Unmarshall};
use hateos_model::{HateosError, HateosResource, HttpMethod, LinkRelation, ResourceName, Selection};
use http::StatusCode;
use tracing::debug;

use crate::handler::{
    HateosContext, HateosHttpEntityHandler, HateosResourceHandler, HttpEntity, RequestContext,
};
use crate::mapping::{HateosResourceMapping, MappingHandler};
use crate::{negotiate, response};

/// Per-request state once the router has resolved the mapping.
pub(crate) struct DispatchRequest<'a> {
    pub(crate) request: &'a http::Request<Bytes>,
    pub(crate) selection: &'a str,
    pub(crate) relation: Option<&'a str>,
    pub(crate) extra_path: &'a [String],
    pub(crate) context: RequestContext,
    pub(crate) marshall: &'a MarshallContext,
}

/// A mapping with its type parameters erased, as stored by the router.
pub(crate) trait MappingDispatch: Send + Sync {
    fn name(&self) -> &ResourceName;

    fn resource_type(&self) -> (TypeId, &'static str);

    fn bindings(&self) -> Vec<(LinkRelation, HttpMethod)>;

    fn dispatch(&self, request: DispatchRequest<'_>) -> Result<http::Response<Bytes>, HateosError>;
}

impl<I, V, C, R> MappingDispatch for HateosResourceMapping<I, V, C, R>
where
    I: Send + Sync + 'static,
    V: Marshall + Unmarshall + Send + 'static,
    C: Marshall + Unmarshall + Send + 'static,
    R: HateosResource,
{
    fn name(&self) -> &ResourceName {
        &self.table.name
    }

    fn resource_type(&self) -> (TypeId, &'static str) {
        (TypeId::of::<R>(), type_name::<R>())
    }

    fn bindings(&self) -> Vec<(LinkRelation, HttpMethod)> {
        self.table.bindings()
    }

    fn dispatch(&self, request: DispatchRequest<'_>) -> Result<http::Response<Bytes>, HateosError> {
        let table = &self.table;

        let selection = (table.parser)(request.selection, &request.context)
            .map_err(|e| HateosError::bad_request(e.message()))?;
        debug!(resource = %table.name, selection = selection.kind(), "parsed selection");

        if let Some(path_name) = request.relation {
            if let Some(handler) = table.http_handlers.get(path_name) {
                debug!(resource = %table.name, path_name, "dispatching to http handler");
                return Ok(handler.handle(
                    &selection,
                    request.extra_path,
                    request.request,
                    &request.context,
                ));
            }
        }

        let relation = match request.relation {
            Some(text) => LinkRelation::parse(text)?,
            None => LinkRelation::SELF,
        };
        let allowed = table.allowed_methods(&relation);
        if allowed.is_empty() {
            return Err(HateosError::bad_request(format!(
                "Unknown link relation \"{relation}\""
            )));
        }
        let method = request.context.method.clone();
        let Some(handler) = table.handlers.get(&(relation.clone(), method.clone())) else {
            return Err(HateosError::method_not_allowed(
                format!("{method} resource: {}, link relation: {relation}", table.name),
                &allowed,
            ));
        };

        let headers = request.request.headers();
        let body = request.request.body();
        negotiate::check_content_length(headers, body)?;

        let media_type = request.context.media_type;
        let context = HateosContext::new(request.context, relation);
        match handler {
            MappingHandler::Entity(handler) => {
                let entity = HttpEntity {
                    headers: headers.clone(),
                    body: body.clone(),
                };
                dispatch_entity(handler.as_ref(), &selection, entity, &context)
            }
            MappingHandler::Resource(handler) => {
                negotiate::check_accept(headers, media_type)?;
                let text = negotiate::body_text(headers, body, media_type)?;
                let resource = Resource {
                    body: text.as_deref(),
                    media_type,
                    root: table.name.as_str(),
                    marshall: request.marshall,
                };
                resource.dispatch(handler.as_ref(), &selection, &context)
            }
        }
    }
}

fn dispatch_entity<I>(
    handler: &dyn HateosHttpEntityHandler<I>,
    selection: &Selection<I>,
    entity: HttpEntity,
    context: &HateosContext,
) -> Result<http::Response<Bytes>, HateosError> {
    let entity = match selection {
        Selection::None => handler.handle_none(entity, context),
        Selection::One(id) => handler.handle_one(id, entity, context),
        Selection::All => handler.handle_all(entity, context),
        Selection::Range(range) => handler.handle_range(range, entity, context),
        Selection::List(ids) => handler.handle_many(ids, entity, context),
    }?;
    Ok(response::from_entity(entity))
}

/// Body decoding and result encoding for a typed handler call.
struct Resource<'a> {
    body: Option<&'a str>,
    media_type: MediaType,
    root: &'a str,
    marshall: &'a MarshallContext,
}

impl Resource<'_> {
    fn dispatch<I, V, C>(
        &self,
        handler: &dyn HateosResourceHandler<I, V, C>,
        selection: &Selection<I>,
        context: &HateosContext,
    ) -> Result<http::Response<Bytes>, HateosError>
    where
        V: Marshall + Unmarshall,
        C: Marshall + Unmarshall,
    {
        match selection {
            Selection::None => {
                let result = handler.handle_none(self.decode()?, context)?;
                self.encode(result.as_ref(), StatusCode::CREATED)
            }
            Selection::One(id) => {
                let result = handler.handle_one(id, self.decode()?, context)?;
                self.encode(result.as_ref(), StatusCode::OK)
            }
            Selection::All => {
                let result = handler.handle_all(self.decode()?, context)?;
                self.encode(result.as_ref(), StatusCode::OK)
            }
            Selection::Range(range) => {
                let result = handler.handle_range(range, self.decode()?, context)?;
                self.encode(result.as_ref(), StatusCode::OK)
            }
            Selection::List(ids) => {
                let result = handler.handle_many(ids, self.decode()?, context)?;
                self.encode(result.as_ref(), StatusCode::OK)
            }
        }
    }

    fn decode<T: Unmarshall>(&self) -> Result<Option<T>, HateosError> {
        let Some(text) = self.body else {
            return Ok(None);
        };
        let node = self
            .media_type
            .parse(text)
            .map_err(|e| self.invalid_body(&e))?;
        self.marshall
            .unmarshall(&node)
            .map(Some)
            .map_err(|e| self.invalid_body(&e))
    }

    fn invalid_body(&self, err: &CodecError) -> HateosError {
        HateosError::bad_request(format!("Invalid {}: {err}", self.media_type.format_name()))
    }

    fn encode<T: Marshall>(
        &self,
        value: Option<&T>,
        status: StatusCode,
    ) -> Result<http::Response<Bytes>, HateosError> {
        let Some(value) = value else {
            return Ok(response::no_content());
        };
        let text = self
            .marshall
            .marshall(value)
            .and_then(|node| self.media_type.to_text(self.root, &node))
            .map_err(|e| {
                tracing::error!(error = %e, resource = self.root, "failed to marshall handler result");
                HateosError::internal(&e.to_string())
            })?;
        Ok(response::entity_response(status, self.media_type, text))
    }
}
