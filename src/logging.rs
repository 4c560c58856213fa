// Macros file - tracing macros are imported within the macro definitions

/// Standardized logging macros for consistent field names and message patterns across the application
///
/// These macros ensure:
/// - Consistent field naming conventions
/// - Appropriate logging levels for different scenarios
/// - Structured logging with context
/// - Consistent message formatting

// ============================================================================
// API Operation Logging Macros
// ============================================================================

/// Log the start of an API operation with consistent fields
#[macro_export]
macro_rules! log_api_start {
    ($operation:expr, learner_id = $learner_id:expr) => {
        tracing::debug!(
            operation = $operation,
            learner_id = %$learner_id,
            "API operation started"
        );
    };
    ($operation:expr, quiz_id = $quiz_id:expr) => {
        tracing::debug!(
            operation = $operation,
            quiz_id = %$quiz_id,
            "API operation started"
        );
    };
    ($operation:expr, lesson_id = $lesson_id:expr) => {
        tracing::debug!(
            operation = $operation,
            lesson_id = %$lesson_id,
            "API operation started"
        );
    };
    ($operation:expr, subject_id = $subject_id:expr) => {
        tracing::debug!(
            operation = $operation,
            subject_id = %$subject_id,
            "API operation started"
        );
    };
    ($operation:expr) => {
        tracing::debug!(
            operation = $operation,
            "API operation started"
        );
    };
}

/// Log successful completion of an API operation
#[macro_export]
macro_rules! log_api_success {
    ($operation:expr, learner_id = $learner_id:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            learner_id = %$learner_id,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, quiz_id = $quiz_id:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            quiz_id = %$quiz_id,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, lesson_id = $lesson_id:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            lesson_id = %$lesson_id,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, count = $count:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            count = $count,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            "API operation completed: {}", $msg
        );
    };
}

/// Log API operation errors with consistent structure
#[macro_export]
macro_rules! log_api_error {
    ($operation:expr, learner_id = $learner_id:expr, error = $error:expr, $msg:expr) => {
        tracing::error!(
            operation = $operation,
            learner_id = %$learner_id,
            error = %$error,
            "API operation failed: {}", $msg
        );
    };
    ($operation:expr, quiz_id = $quiz_id:expr, error = $error:expr, $msg:expr) => {
        tracing::error!(
            operation = $operation,
            quiz_id = %$quiz_id,
            error = %$error,
            "API operation failed: {}", $msg
        );
    };
    ($operation:expr, lesson_id = $lesson_id:expr, error = $error:expr, $msg:expr) => {
        tracing::error!(
            operation = $operation,
            lesson_id = %$lesson_id,
            error = %$error,
            "API operation failed: {}", $msg
        );
    };
    ($operation:expr, error = $error:expr, $msg:expr) => {
        tracing::error!(
            operation = $operation,
            error = %$error,
            "API operation failed: {}", $msg
        );
    };
}

/// Log API warnings with context
#[macro_export]
macro_rules! log_api_warn {
    ($operation:expr, learner_id = $learner_id:expr, $msg:expr) => {
        tracing::warn!(
            operation = $operation,
            learner_id = %$learner_id,
            "API operation warning: {}", $msg
        );
    };
    ($operation:expr, quiz_id = $quiz_id:expr, $msg:expr) => {
        tracing::warn!(
            operation = $operation,
            quiz_id = %$quiz_id,
            "API operation warning: {}", $msg
        );
    };
    ($operation:expr, $msg:expr) => {
        tracing::warn!(
            operation = $operation,
            "API operation warning: {}", $msg
        );
    };
}

// ============================================================================
// Database Operation Logging Macros
// ============================================================================

/// Log database operation performance and results
#[macro_export]
macro_rules! log_db_operation {
    (debug, $operation:expr, count = $count:expr, duration_ms = $duration:expr) => {
        tracing::debug!(
            component = "database",
            operation = $operation,
            result_count = $count,
            duration_ms = $duration,
            "Database operation completed"
        );
    };
    (info, $operation:expr, $msg:expr) => {
        tracing::info!(
            component = "database",
            operation = $operation,
            "Database operation: {}", $msg
        );
    };
    (error, $operation:expr, error = $error:expr) => {
        tracing::error!(
            component = "database",
            operation = $operation,
            error = %$error,
            "Database operation failed"
        );
    };
}

// ============================================================================
// System Event Logging Macros
// ============================================================================

/// Log system startup and shutdown events
#[macro_export]
macro_rules! log_system_event {
    (startup, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "startup",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (shutdown, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "shutdown",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (config, $msg:expr) => {
        tracing::info!(event_type = "configuration", "System event: {}", $msg);
    };
}

// ============================================================================
// Validation Logging Macros
// ============================================================================

/// Log validation results consistently
#[macro_export]
macro_rules! log_validation {
    (success, $component:expr, $msg:expr) => {
        tracing::debug!(
            event_type = "validation",
            component = $component,
            result = "success",
            "Validation completed: {}", $msg
        );
    };
    (failure, $component:expr, error = $error:expr) => {
        tracing::warn!(
            event_type = "validation",
            component = $component,
            result = "failure",
            error = %$error,
            "Validation failed"
        );
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_logging_macros_compile() {
        let learner_id = 7i64;
        let quiz_id = 42i64;
        let error = anyhow::anyhow!("test error");

        // Test that all macro variants compile successfully
        log_api_start!("test_operation", learner_id = learner_id);
        log_api_start!("test_operation", quiz_id = quiz_id);
        log_api_start!("test_operation", lesson_id = 3i64);
        log_api_start!("test_operation", subject_id = 1i64);
        log_api_start!("test_operation");

        log_api_success!("test_operation", learner_id = learner_id, "operation completed");
        log_api_success!("test_operation", count = 5, "rows returned");

        log_api_error!("test_operation", quiz_id = quiz_id, error = error, "operation failed");
        log_api_warn!("test_operation", quiz_id = quiz_id, "operation warning");

        log_db_operation!(debug, "select_lessons", count = 3, duration_ms = 10);
        log_db_operation!(info, "migration", "database initialized");

        log_system_event!(startup, component = "server", "server starting");
        log_system_event!(config, "configuration loaded successfully");

        log_validation!(success, "api_request", "request validated");
    }
}
