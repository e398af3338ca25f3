//! Checks for one operation present on both sides
//!
//! Parameters, request bodies, responses and operation security. Schemas
//! found along the way are handed to the schema checks with the right
//! location.

use apicompat_core::diff::{
    ContentDiff, HeadersDiff, OperationDiff, ParametersDiff, RequestBodyDiff, ResponsesDiff, SecurityRequirementsDiff,
    ValueDiff,
};
use apicompat_core::rules::ids;
use apicompat_core::{Finding, Location};

use crate::collector::{Collector, OperationContext};
use crate::schema_checks::{check_schema, SchemaTarget};

/// Run every operation-level check
pub(crate) fn check_operation(collector: &mut Collector<'_>, op: &OperationContext, diff: &OperationDiff) {
    check_operation_id(collector, op, diff.operation_id.as_ref());

    if let Some(tags) = &diff.tags {
        for tag in &tags.added {
            collector.api(op, ids::API_TAG_ADDED, vec![tag.clone()], None);
        }
        for tag in &tags.deleted {
            collector.api(op, ids::API_TAG_REMOVED, vec![tag.clone()], None);
        }
    }

    if let Some(parameters) = &diff.parameters {
        check_parameters(collector, op, parameters);
    }
    if let Some(body) = &diff.request_body {
        check_request_body(collector, op, body);
    }
    if let Some(responses) = &diff.responses {
        check_responses(collector, op, responses);
    }
    if let Some(security) = &diff.security {
        check_security(collector, op, security);
    }
}

fn check_operation_id(collector: &mut Collector<'_>, op: &OperationContext, diff: Option<&ValueDiff<String>>) {
    let Some(diff) = diff.filter(|d| !d.is_empty()) else {
        return;
    };

    match (&diff.from, &diff.to) {
        (None, Some(to)) => collector.api(op, ids::API_OPERATION_ID_ADDED, vec![to.clone()], None),
        (Some(from), None) => collector.api(op, ids::API_OPERATION_ID_REMOVED, vec![from.clone()], None),
        (Some(from), Some(to)) => {
            collector.api(op, ids::API_OPERATION_ID_CHANGED, vec![from.clone(), to.clone()], None)
        }
        (None, None) => {}
    }
}

fn report(collector: &mut Collector<'_>, op: &OperationContext, location: Location, finding: Finding, args: Vec<String>) {
    collector.api(op, &finding.rule_id(location), args, None);
}

fn check_parameters(collector: &mut Collector<'_>, op: &OperationContext, diff: &ParametersDiff) {
    let location = Location::RequestParameter;

    for param in &diff.added {
        let finding = Finding::added(param.is_required(), param.has_default());
        report(collector, op, location, finding, vec![param.location.to_string(), param.name.clone()]);
    }

    for param in &diff.deleted {
        report(
            collector,
            op,
            location,
            Finding::Removed,
            vec![param.location.to_string(), param.name.clone()],
        );
    }

    for param in &diff.modified {
        let subject = vec![param.revision.location.to_string(), param.revision.name.clone()];

        if param.required.as_ref().map_or(false, |d| !d.is_empty()) {
            let finding = match (param.base.is_required(), param.revision.is_required()) {
                (false, true) => Some(Finding::BecameRequired {
                    with_default: param.revision.has_default(),
                }),
                (true, false) => Some(Finding::BecameOptional),
                _ => None,
            };
            if let Some(finding) = finding {
                report(collector, op, location, finding, subject.clone());
            }
        }

        let target = SchemaTarget {
            root: location,
            nested: None,
            root_args: subject,
            status: None,
            comment: None,
        };
        check_schema(collector, op, &target, param.schema.as_ref());
    }
}

fn check_request_body(collector: &mut Collector<'_>, op: &OperationContext, diff: &RequestBodyDiff) {
    let location = Location::RequestBody;

    match (&diff.base, &diff.revision) {
        (None, Some(body)) => {
            report(collector, op, location, Finding::added(body.required, false), vec![]);
            return;
        }
        (Some(_), None) => {
            report(collector, op, location, Finding::Removed, vec![]);
            return;
        }
        _ => {}
    }

    if let Some(required) = diff.required.as_ref().filter(|d| !d.is_empty()) {
        let finding = if required.to.unwrap_or(false) {
            Finding::BecameRequired { with_default: false }
        } else {
            Finding::BecameOptional
        };
        report(collector, op, location, finding, vec![]);
    }

    if let Some(content) = &diff.content {
        check_content(collector, op, content, None);
    }
}

/// Media types of a request body (`status` is `None`) or of one response
fn check_content(collector: &mut Collector<'_>, op: &OperationContext, diff: &ContentDiff, status: Option<&str>) {
    let (added_id, removed_id) = match status {
        None => (ids::REQUEST_BODY_MEDIA_TYPE_ADDED, ids::REQUEST_BODY_MEDIA_TYPE_REMOVED),
        Some(_) => (ids::RESPONSE_MEDIA_TYPE_ADDED, ids::RESPONSE_MEDIA_TYPE_REMOVED),
    };
    let media_args = |media: &str| -> Vec<String> {
        std::iter::once(media.to_string())
            .chain(status.map(str::to_string))
            .collect()
    };

    for media in &diff.added {
        collector.api(op, added_id, media_args(media), None);
    }
    for media in &diff.deleted {
        collector.api(op, removed_id, media_args(media), None);
    }

    for (media, node) in &diff.modified {
        let target = match status {
            None => SchemaTarget {
                root: Location::RequestBody,
                nested: Some(Location::RequestProperty),
                root_args: vec![],
                status: None,
                comment: Some(media_comment(media)),
            },
            Some(status) => SchemaTarget {
                root: Location::ResponseBody,
                nested: Some(Location::ResponseProperty),
                root_args: vec![status.to_string()],
                status: Some(status.to_string()),
                comment: Some(media_comment(media)),
            },
        };
        check_schema(collector, op, &target, Some(node));
    }
}

fn media_comment(media: &str) -> String {
    format!("media type '{}'", media)
}

/// 2xx responses are success responses
fn is_success_status(status: &str) -> bool {
    status.starts_with('2')
}

fn check_responses(collector: &mut Collector<'_>, op: &OperationContext, diff: &ResponsesDiff) {
    for status in &diff.added {
        let id = if is_success_status(status) {
            ids::RESPONSE_SUCCESS_STATUS_ADDED
        } else {
            ids::RESPONSE_NON_SUCCESS_STATUS_ADDED
        };
        collector.api(op, id, vec![status.clone()], None);
    }

    for status in &diff.deleted {
        let id = if is_success_status(status) {
            ids::RESPONSE_SUCCESS_STATUS_REMOVED
        } else {
            ids::RESPONSE_NON_SUCCESS_STATUS_REMOVED
        };
        collector.api(op, id, vec![status.clone()], None);
    }

    for (status, response) in &diff.modified {
        if let Some(content) = &response.content {
            check_content(collector, op, content, Some(status));
        }
        if let Some(headers) = &response.headers {
            check_headers(collector, op, headers, status);
        }
    }
}

fn check_headers(collector: &mut Collector<'_>, op: &OperationContext, diff: &HeadersDiff, status: &str) {
    let location = Location::ResponseHeader;
    let subject = |name: &str| vec![name.to_string(), status.to_string()];

    for (name, header) in &diff.added {
        report(collector, op, location, Finding::added(header.required, false), subject(name));
    }
    for name in diff.deleted.keys() {
        report(collector, op, location, Finding::Removed, subject(name));
    }

    for (name, header) in &diff.modified {
        if let Some(required) = header.required.as_ref().filter(|d| !d.is_empty()) {
            let finding = if required.to.unwrap_or(false) {
                Finding::BecameRequired { with_default: false }
            } else {
                Finding::BecameOptional
            };
            report(collector, op, location, finding, subject(name));
        }

        let target = SchemaTarget {
            root: location,
            nested: None,
            root_args: subject(name),
            status: None,
            comment: None,
        };
        check_schema(collector, op, &target, header.schema.as_ref());
    }
}

fn check_security(collector: &mut Collector<'_>, op: &OperationContext, diff: &SecurityRequirementsDiff) {
    for name in &diff.added {
        collector.api(op, ids::API_SECURITY_ADDED, vec![name.clone()], None);
    }
    for name in &diff.deleted {
        collector.api(op, ids::API_SECURITY_REMOVED, vec![name.clone()], None);
    }
    for (name, scopes) in &diff.modified {
        for scope in &scopes.added {
            collector.api(op, ids::API_SECURITY_SCOPE_ADDED, vec![name.clone(), scope.clone()], None);
        }
        for scope in &scopes.deleted {
            collector.api(op, ids::API_SECURITY_SCOPE_REMOVED, vec![name.clone(), scope.clone()], None);
        }
    }
}
