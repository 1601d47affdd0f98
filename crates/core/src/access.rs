//! Role-based access decisions.
//!
//! Every function here is pure: the HTTP layer loads the project ownership
//! columns (and, for crew, whether a `project_crew` row exists) and asks
//! this module for a verdict. Denials are returned as
//! [`CoreError::Forbidden`] so handlers can propagate them with `?`.
//!
//! | Role        | Sees a project when                     |
//! |-------------|-----------------------------------------|
//! | admin       | always                                  |
//! | producer    | `projects.producer_id` is the user      |
//! | crew        | a `project_crew` row links the user     |
//! | broadcaster | `projects.client_id` is the user        |
//! | investor    | `projects.investor_id` is the user      |

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// The ownership columns of a project that access decisions depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectOwnership {
    pub producer_id: Option<DbId>,
    pub client_id: Option<DbId>,
    pub investor_id: Option<DbId>,
}

/// Which projects a user may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFilter {
    All,
    Producer(DbId),
    Client(DbId),
    Investor(DbId),
    /// Resolved through the `project_crew` join table.
    CrewMember(DbId),
}

/// Optional id binds for the `($n::BIGINT IS NULL OR column = $n)` predicates
/// used by the repositories. At most one field is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectScopeBinds {
    pub producer_id: Option<DbId>,
    pub client_id: Option<DbId>,
    pub investor_id: Option<DbId>,
    pub crew_user_id: Option<DbId>,
}

impl ProjectFilter {
    pub fn binds(self) -> ProjectScopeBinds {
        let mut binds = ProjectScopeBinds::default();
        match self {
            ProjectFilter::All => {}
            ProjectFilter::Producer(id) => binds.producer_id = Some(id),
            ProjectFilter::Client(id) => binds.client_id = Some(id),
            ProjectFilter::Investor(id) => binds.investor_id = Some(id),
            ProjectFilter::CrewMember(id) => binds.crew_user_id = Some(id),
        }
        binds
    }
}

/// Build the project listing filter for a user.
pub fn project_filter_for(user_id: DbId, role: Role) -> ProjectFilter {
    match role {
        Role::Admin => ProjectFilter::All,
        Role::Producer => ProjectFilter::Producer(user_id),
        Role::Broadcaster => ProjectFilter::Client(user_id),
        Role::Investor => ProjectFilter::Investor(user_id),
        Role::Crew => ProjectFilter::CrewMember(user_id),
    }
}

/// Whether `user_id` with `role` may view a project.
///
/// `crew_assigned` is only consulted for crew users.
pub fn check_project_access(
    role: Role,
    user_id: DbId,
    project: &ProjectOwnership,
    crew_assigned: bool,
) -> Result<(), CoreError> {
    match role {
        Role::Admin => Ok(()),
        Role::Producer if project.producer_id == Some(user_id) => Ok(()),
        Role::Producer => Err(CoreError::Forbidden(
            "You are not assigned as producer for this project".into(),
        )),
        Role::Crew if crew_assigned => Ok(()),
        Role::Crew => Err(CoreError::Forbidden(
            "You are not assigned to this project".into(),
        )),
        Role::Broadcaster if project.client_id == Some(user_id) => Ok(()),
        Role::Investor if project.investor_id == Some(user_id) => Ok(()),
        Role::Broadcaster | Role::Investor => Err(CoreError::Forbidden(
            "You do not have access to this project".into(),
        )),
    }
}

/// Whether a user may manage a project (episodes, tasks, approvals).
///
/// Admins always may; producers only for projects they are assigned to.
pub fn check_producer_access(
    role: Role,
    user_id: DbId,
    project: &ProjectOwnership,
) -> Result<(), CoreError> {
    match role {
        Role::Admin => Ok(()),
        Role::Producer if project.producer_id == Some(user_id) => Ok(()),
        Role::Producer => Err(CoreError::Forbidden(
            "You are not assigned as producer for this project".into(),
        )),
        _ => Err(CoreError::Forbidden(
            "Only producers can perform this action".into(),
        )),
    }
}

/// Whether a user may act on a project's tasks as crew.
///
/// Admins and producers always pass; crew must be assigned.
pub fn check_crew_assignment(role: Role, crew_assigned: bool) -> Result<(), CoreError> {
    match role {
        Role::Admin | Role::Producer => Ok(()),
        Role::Crew if crew_assigned => Ok(()),
        Role::Crew => Err(CoreError::Forbidden(
            "You are not assigned to this project".into(),
        )),
        _ => Err(CoreError::Forbidden(
            "Only crew members can perform this action".into(),
        )),
    }
}

/// Broadcasters only see assets that are public and belong to a project
/// they are the client of. Every other role passes.
pub fn check_asset_visibility(
    role: Role,
    user_id: DbId,
    project_client_id: Option<DbId>,
    is_public_to_broadcaster: bool,
) -> Result<(), CoreError> {
    if role != Role::Broadcaster {
        return Ok(());
    }
    if project_client_id == Some(user_id) && is_public_to_broadcaster {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "You do not have access to this file".into(),
        ))
    }
}

/// Asset metadata may be changed by admins, producers, or the uploader.
pub fn check_asset_owner(role: Role, user_id: DbId, uploaded_by: DbId) -> Result<(), CoreError> {
    if role.is_manager() || uploaded_by == user_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Not authorized to modify this asset".into(),
        ))
    }
}

/// Crew may only change the status of their own milestones.
pub fn check_task_owner(role: Role, user_id: DbId, milestone_user_id: DbId) -> Result<(), CoreError> {
    match role {
        Role::Crew if milestone_user_id != user_id => Err(CoreError::Forbidden(
            "You do not have access to this task".into(),
        )),
        Role::Crew | Role::Admin | Role::Producer => Ok(()),
        _ => Err(CoreError::Forbidden(
            "Only crew, producers, or admins can update task status".into(),
        )),
    }
}
