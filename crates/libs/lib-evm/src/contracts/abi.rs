//! Solidity interfaces of the two deployed contracts.

use alloy_sol_types::sol;

sol! {
    /// Membership registry: members, contributions and voting power.
    #[derive(Debug, PartialEq, Eq)]
    interface ICommunityDao {
        function registerMember() external payable returns (uint256);
        function addContribution() external payable;
        function totalMembers() external view returns (uint256);
        function getMemberStruct(address _member) external view returns (address memberAddress, uint256 contribution, uint256 profileNftId, uint256 votingPower, bool exists);

        event MemberRegistered(address indexed member, uint256 nftId);
        event ContributionAdded(address indexed member, uint256 amount, uint256 votingPower);
    }
}

sol! {
    /// Communities, their treasuries and funding polls.
    #[derive(Debug, PartialEq, Eq)]
    interface ICreateCommunity {
        function createCommunity(string memory _name, string memory _description) public returns (uint256);
        function createPoll(uint256 _communityId, string memory _question, string[] memory _options, address[] memory _recipients, uint256 _duration, uint256 _totalFund) external payable returns (uint256);
        function vote(uint256 _communityId, uint256 _pollId, uint256 _option) external;
        function closePoll(uint256 _communityId, uint256 _pollId) external;
        function contributeToTreasury(uint256 _communityId) external payable;
        function getWinningOption(uint256 _communityId, uint256 _pollId) public view returns (uint256);
        function communityCount() external view returns (uint256);
        function communities(uint256) external view returns (string memory name, string memory description, address creator, uint256 creationTime, uint256 treasury);
        function communityPolls(uint256, uint256) external view returns (string memory question, uint256 creationTime, uint256 endTime, bool isClosed, bool fundsDistributed, uint256 totalVotes, uint256 totalFund);
        function hasVoted(uint256, uint256, address) external view returns (bool);

        event CommunityCreated(uint256 indexed id, string name, address creator);
        event PollCreated(uint256 indexed communityId, uint256 pollId, string question, uint256 totalFund);
        event VoteCast(uint256 indexed communityId, uint256 pollId, address voter, uint256 option, uint256 power);
        event PollClosed(uint256 indexed communityId, uint256 pollId, uint256 winningOption);
        event FundsDistributed(uint256 indexed communityId, uint256 pollId, address winner, uint256 amount);
    }
}
