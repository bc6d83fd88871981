use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

/// SQL query builder for the service-record listing
/// Builds a single parameterized query with filters, sorting, and pagination
///
/// All parameters are carried as text and cast in the query (`::uuid`,
/// `::date`) so binding stays uniform.
pub struct SQLQueryBuilder {
    base_query: String,
    where_clauses: Vec<String>,
    params: Vec<String>,
    order_clause: Option<String>,
    limit: u32,
    offset: u32,
}

impl SQLQueryBuilder {
    /// Creates a new builder scoped to one tenant's records
    pub fn new(tenant_id: Uuid) -> Self {
        Self {
            base_query: "SELECT sr.id, sr.pet_id, sr.tenant_id, sr.service_type_id, sr.staff_id, \
                         sr.service_date, sr.price, sr.notes, sr.is_free, sr.created_at, \
                         st.name AS service_name \
                         FROM service_records sr \
                         JOIN service_types st ON sr.service_type_id = st.id"
                .to_string(),
            where_clauses: vec!["sr.tenant_id = $1::uuid".to_string()],
            params: vec![tenant_id.to_string()],
            order_clause: None,
            limit: 20,
            offset: 0,
        }
    }

    /// Restricts the listing to one pet
    pub fn add_pet_filter(&mut self, pet_id: Uuid) {
        let param_index = self.params.len() + 1;
        self.where_clauses
            .push(format!("sr.pet_id = ${}::uuid", param_index));
        self.params.push(pet_id.to_string());
    }

    /// Restricts the listing to one service type
    pub fn add_service_type_filter(&mut self, service_type_id: Uuid) {
        let param_index = self.params.len() + 1;
        self.where_clauses
            .push(format!("sr.service_type_id = ${}::uuid", param_index));
        self.params.push(service_type_id.to_string());
    }

    /// Adds service-date range filters (min and/or max)
    /// Both bounds are inclusive and compare on the calendar date
    pub fn add_date_range(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        if let Some(start_date) = start {
            let param_index = self.params.len() + 1;
            self.where_clauses
                .push(format!("sr.service_date::date >= ${}::date", param_index));
            self.params.push(start_date.to_string());
        }

        if let Some(end_date) = end {
            let param_index = self.params.len() + 1;
            self.where_clauses
                .push(format!("sr.service_date::date <= ${}::date", param_index));
            self.params.push(end_date.to_string());
        }
    }

    /// Sets the sort order for the query
    pub fn set_sort(&mut self, field: SortField, order: SortOrder) {
        let field_name = match field {
            SortField::ServiceDate => "sr.service_date",
            SortField::Price => "sr.price",
        };

        let order_str = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };

        self.order_clause = Some(format!("{} {}", field_name, order_str));
    }

    /// Sets pagination parameters
    /// Calculates LIMIT and OFFSET based on page number and limit
    pub fn set_pagination(&mut self, page: u32, limit: u32) {
        self.limit = limit;
        self.offset = (page - 1) * limit;
    }

    /// Builds the final SQL query string with all parameters
    /// Returns a tuple of (query_string, parameters)
    pub fn build(&self) -> (String, Vec<String>) {
        let mut query = self.base_query.clone();

        query.push_str(" WHERE ");
        query.push_str(&self.where_clauses.join(" AND "));

        if let Some(ref order) = self.order_clause {
            query.push_str(" ORDER BY ");
            query.push_str(order);
        }

        // LIMIT and OFFSET are validated integers, placed directly in the query
        query.push_str(&format!(" LIMIT {}", self.limit));
        query.push_str(&format!(" OFFSET {}", self.offset));

        (query, self.params.clone())
    }
}

/// Query parameters extracted from the record-listing HTTP request
/// All fields are optional to support flexible querying
#[derive(Debug, Deserialize)]
pub struct RecordQueryParams {
    /// Filter by pet
    pub pet_id: Option<String>,
    /// Filter by service type
    pub service_type_id: Option<String>,
    /// Start of the service-date range (YYYY-MM-DD, inclusive)
    pub start_date: Option<String>,
    /// End of the service-date range (YYYY-MM-DD, inclusive)
    pub end_date: Option<String>,
    /// Sort field: "service_date" or "price"
    pub sort: Option<String>,
    /// Sort order: "asc" or "desc"
    pub order: Option<String>,
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<u32>,
    /// Items per page (defaults to 20)
    pub limit: Option<u32>,
}

/// Sort field options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    ServiceDate,
    Price,
}

/// Sort order options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Validated and normalized query parameters
#[derive(Debug)]
pub struct ValidatedQuery {
    pub pet_id: Option<Uuid>,
    pub service_type_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

/// Validation error type
#[derive(Debug)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Query parameter validator
pub struct QueryValidator;

impl QueryValidator {
    /// Validates and normalizes query parameters
    /// Returns ValidatedQuery on success or ValidationError on failure
    pub fn validate(params: RecordQueryParams) -> Result<ValidatedQuery, ValidationError> {
        let pet_id = Self::parse_uuid(params.pet_id, "pet_id")?;
        let service_type_id = Self::parse_uuid(params.service_type_id, "service_type_id")?;

        let start_date = Self::parse_date(params.start_date, "start_date")?;
        let end_date = Self::parse_date(params.end_date, "end_date")?;

        // Validate start_date <= end_date
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(ValidationError {
                    message: "start_date cannot be after end_date".to_string(),
                });
            }
        }

        let sort_field = if let Some(sort_str) = params.sort {
            Self::parse_sort_field(&sort_str)?
        } else {
            SortField::ServiceDate
        };

        // Default order depends on sort field: newest records first, cheapest first
        let sort_order = if let Some(order_str) = params.order {
            Self::parse_sort_order(&order_str)?
        } else {
            match sort_field {
                SortField::ServiceDate => SortOrder::Desc,
                SortField::Price => SortOrder::Asc,
            }
        };

        let page = if let Some(p) = params.page {
            Self::validate_pagination_param(p, "page")?;
            p
        } else {
            1
        };

        let limit = if let Some(l) = params.limit {
            Self::validate_pagination_param(l, "limit")?;
            l
        } else {
            20
        };

        Ok(ValidatedQuery {
            pet_id,
            service_type_id,
            start_date,
            end_date,
            sort_field,
            sort_order,
            page,
            limit,
        })
    }

    /// Parses an optional UUID parameter, trimming whitespace first
    fn parse_uuid(value: Option<String>, param_name: &str) -> Result<Option<Uuid>, ValidationError> {
        match value {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                Uuid::parse_str(trimmed).map(Some).map_err(|_| ValidationError {
                    message: format!("{} must be a valid UUID", param_name),
                })
            }
            None => Ok(None),
        }
    }

    /// Parses an optional YYYY-MM-DD date parameter
    fn parse_date(
        value: Option<String>,
        param_name: &str,
    ) -> Result<Option<NaiveDate>, ValidationError> {
        match value {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                    .map(Some)
                    .map_err(|_| ValidationError {
                        message: format!("{} must be a date in YYYY-MM-DD format", param_name),
                    })
            }
            None => Ok(None),
        }
    }

    /// Parses sort field string to SortField enum
    fn parse_sort_field(s: &str) -> Result<SortField, ValidationError> {
        match s.to_lowercase().as_str() {
            "service_date" => Ok(SortField::ServiceDate),
            "price" => Ok(SortField::Price),
            _ => Err(ValidationError {
                message: format!(
                    "Invalid sort field '{}'. Must be 'service_date' or 'price'",
                    s
                ),
            }),
        }
    }

    /// Parses sort order string to SortOrder enum
    fn parse_sort_order(s: &str) -> Result<SortOrder, ValidationError> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ValidationError {
                message: format!("Invalid sort order '{}'. Must be 'asc' or 'desc'", s),
            }),
        }
    }

    /// Validates pagination parameters (page and limit)
    /// Must be positive (not zero)
    fn validate_pagination_param(value: u32, param_name: &str) -> Result<(), ValidationError> {
        if value == 0 {
            return Err(ValidationError {
                message: format!("{} must be a positive number (greater than 0)", param_name),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_params() -> RecordQueryParams {
        RecordQueryParams {
            pet_id: None,
            service_type_id: None,
            start_date: None,
            end_date: None,
            sort: None,
            order: None,
            page: None,
            limit: None,
        }
    }

    #[test]
    fn test_sql_builder_basic_query() {
        let tenant_id = Uuid::new_v4();
        let builder = SQLQueryBuilder::new(tenant_id);
        let (query, params) = builder.build();

        assert!(query.contains("FROM service_records sr"));
        assert!(query.contains("sr.tenant_id = $1::uuid"));
        assert!(query.contains("LIMIT 20"));
        assert!(query.contains("OFFSET 0"));
        assert_eq!(params.len(), 1);
        assert_eq!(params[0], tenant_id.to_string());
    }

    #[test]
    fn test_sql_builder_with_pet_filter() {
        let pet_id = Uuid::new_v4();
        let mut builder = SQLQueryBuilder::new(Uuid::new_v4());
        builder.add_pet_filter(pet_id);
        let (query, params) = builder.build();

        assert!(query.contains("sr.pet_id = $2::uuid"));
        assert_eq!(params[1], pet_id.to_string());
    }

    #[test]
    fn test_sql_builder_with_date_range() {
        let mut builder = SQLQueryBuilder::new(Uuid::new_v4());
        builder.add_date_range(
            NaiveDate::from_ymd_opt(2024, 1, 1),
            NaiveDate::from_ymd_opt(2024, 1, 31),
        );
        let (query, params) = builder.build();

        assert!(query.contains("sr.service_date::date >= $2::date"));
        assert!(query.contains("sr.service_date::date <= $3::date"));
        assert_eq!(params[1], "2024-01-01");
        assert_eq!(params[2], "2024-01-31");
    }

    #[test]
    fn test_sql_builder_with_sorting() {
        let mut builder = SQLQueryBuilder::new(Uuid::new_v4());
        builder.set_sort(SortField::Price, SortOrder::Desc);
        let (query, _) = builder.build();

        assert!(query.contains("ORDER BY sr.price DESC"));
    }

    #[test]
    fn test_sql_builder_with_pagination() {
        let mut builder = SQLQueryBuilder::new(Uuid::new_v4());
        builder.set_pagination(3, 25);
        let (query, _params) = builder.build();

        assert!(query.contains("LIMIT 25"));
        assert!(query.contains("OFFSET 50"));
    }

    #[test]
    fn test_sql_builder_combined_filters() {
        let tenant_id = Uuid::new_v4();
        let pet_id = Uuid::new_v4();
        let service_type_id = Uuid::new_v4();

        let mut builder = SQLQueryBuilder::new(tenant_id);
        builder.add_pet_filter(pet_id);
        builder.add_service_type_filter(service_type_id);
        builder.add_date_range(NaiveDate::from_ymd_opt(2024, 3, 1), None);
        builder.set_sort(SortField::ServiceDate, SortOrder::Desc);
        builder.set_pagination(1, 10);

        let (query, params) = builder.build();

        assert!(query.contains("sr.tenant_id = $1::uuid"));
        assert!(query.contains("AND"));
        assert!(query.contains("sr.pet_id = $2::uuid"));
        assert!(query.contains("sr.service_type_id = $3::uuid"));
        assert!(query.contains("sr.service_date::date >= $4::date"));
        assert!(query.contains("ORDER BY sr.service_date DESC"));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_validate_defaults() {
        let validated = QueryValidator::validate(empty_params()).unwrap();

        assert_eq!(validated.page, 1);
        assert_eq!(validated.limit, 20);
        assert_eq!(validated.sort_field, SortField::ServiceDate);
        assert_eq!(validated.sort_order, SortOrder::Desc);
        assert_eq!(validated.pet_id, None);
        assert_eq!(validated.start_date, None);
    }

    #[test]
    fn test_validate_parses_uuid_and_dates() {
        let pet_id = Uuid::new_v4();
        let mut params = empty_params();
        params.pet_id = Some(pet_id.to_string());
        params.start_date = Some("2024-01-01".to_string());
        params.end_date = Some("2024-02-01".to_string());

        let validated = QueryValidator::validate(params).unwrap();

        assert_eq!(validated.pet_id, Some(pet_id));
        assert_eq!(validated.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(validated.end_date, NaiveDate::from_ymd_opt(2024, 2, 1));
    }

    #[test]
    fn test_validate_rejects_malformed_uuid() {
        let mut params = empty_params();
        params.pet_id = Some("not-a-uuid".to_string());

        assert!(QueryValidator::validate(params).is_err());
    }

    #[test]
    fn test_validate_rejects_malformed_date() {
        let mut params = empty_params();
        params.start_date = Some("01/02/2024".to_string());

        assert!(QueryValidator::validate(params).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_date_range() {
        let mut params = empty_params();
        params.start_date = Some("2024-02-01".to_string());
        params.end_date = Some("2024-01-01".to_string());

        assert!(QueryValidator::validate(params).is_err());
    }

    #[test]
    fn test_validate_blank_params_are_ignored() {
        let mut params = empty_params();
        params.pet_id = Some("   ".to_string());
        params.start_date = Some("".to_string());

        let validated = QueryValidator::validate(params).unwrap();

        assert_eq!(validated.pet_id, None);
        assert_eq!(validated.start_date, None);
    }

    #[test]
    fn test_validate_sort_defaults_per_field() {
        // service_date sort defaults to descending
        let mut params = empty_params();
        params.sort = Some("service_date".to_string());
        let validated = QueryValidator::validate(params).unwrap();
        assert_eq!(validated.sort_order, SortOrder::Desc);

        // price sort defaults to ascending
        let mut params = empty_params();
        params.sort = Some("price".to_string());
        let validated = QueryValidator::validate(params).unwrap();
        assert_eq!(validated.sort_field, SortField::Price);
        assert_eq!(validated.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_validate_rejects_unknown_sort_field() {
        let mut params = empty_params();
        params.sort = Some("notes".to_string());

        assert!(QueryValidator::validate(params).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_pagination() {
        let mut params = empty_params();
        params.page = Some(0);

        assert!(QueryValidator::validate(params).is_err());
    }
}
