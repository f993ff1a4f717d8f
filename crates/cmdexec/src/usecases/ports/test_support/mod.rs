mod mock_repository;

pub use mock_repository::MockProcessRepository;
