//! Diesel schema for task persistence.

diesel::table! {
    /// Delegated task records.
    tasks (id) {
        /// Internal task identifier.
        id -> Uuid,
        /// Task title.
        title -> Text,
        /// Task description.
        description -> Text,
        /// Assignee platform identifier.
        assigned_to -> Int8,
        /// Assigner platform identifier.
        assigned_by -> Int8,
        /// Guild scope.
        guild_id -> Int8,
        /// Deadline instant.
        deadline -> Timestamptz,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Lifecycle status.
        #[max_length = 32]
        status -> Varchar,
        /// Priority.
        #[max_length = 16]
        priority -> Varchar,
        /// One-time reminder marker.
        reminder_sent -> Bool,
        /// One-time overdue marker.
        deadline_notified -> Bool,
        /// Completion timestamp.
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Append-only audit trail of status changes.
    task_updates (id) {
        /// Audit row identifier.
        id -> Uuid,
        /// Task the change applied to.
        task_id -> Uuid,
        /// Acting user.
        actor_id -> Int8,
        /// Status written.
        #[max_length = 32]
        new_status -> Varchar,
        /// Optional note.
        note -> Nullable<Text>,
        /// When the change was recorded.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(task_updates -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, task_updates);
