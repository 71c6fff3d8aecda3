//! Diesel schema for user statistics.

diesel::table! {
    /// Aggregate counters per user and guild.
    user_stats (user_id, guild_id) {
        /// User platform identifier.
        user_id -> Int8,
        /// Guild scope.
        guild_id -> Int8,
        /// Tasks completed.
        tasks_completed -> Int8,
        /// Tasks flagged overdue.
        tasks_overdue -> Int8,
        /// Karma balance.
        karma_points -> Int8,
        /// Instant of the latest delta.
        last_updated -> Timestamptz,
    }
}
